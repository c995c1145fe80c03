//! Household chore board server library.
//!
//! Exposes the HTTP API, shared state, and rollover ticker for use in tests
//! and embedding. The binary in `main.rs` wires them to a file-backed board.

pub mod api;
pub mod config;
pub mod error;
pub mod sessions;
pub mod state;
pub mod ticker;
