//! Shared data model for the chore board.
//!
//! Everything both the engine and the HTTP service need to agree on lives
//! here: residents and assignees, task templates and instances, laundry
//! reservations, saved credentials, and the persisted board document.

pub mod codec;
pub mod credential;
pub mod laundry;
pub mod resident;
pub mod task;
