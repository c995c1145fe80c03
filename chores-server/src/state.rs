//! Shared server state.

use chores::Board;
use tokio::sync::Mutex;

use crate::sessions::SessionRegistry;

/// State shared by every handler and the rollover ticker.
///
/// The board, including its user directory, sits behind a single [`Mutex`]
/// so that no two mutations or their saves ever interleave.
pub struct AppState {
    /// The household board.
    pub board: Mutex<Board>,
    /// Live login sessions.
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Wraps an opened board.
    #[must_use]
    pub fn new(board: Board) -> Self {
        Self {
            board: Mutex::new(board),
            sessions: SessionRegistry::new(),
        }
    }
}
