//! Chore rotation engine.
//!
//! Decides who owns each recurring household chore, recomputes deadlines
//! when chores are completed, and rolls tasks over at day, week, and month
//! boundaries. [`board::Board`] ties the pieces together behind a clock, an
//! authorizer, and a persistence collaborator.

pub mod auth;
pub mod board;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod laundry;
pub mod metrics;
pub mod persistence;
pub mod recurrence;
pub mod report;
pub mod rollover;
pub mod roster;
pub mod rotation;
pub mod store;

pub use board::{Board, BoardError};
pub use store::{StoreError, TaskStore, ToggleOutcome};
