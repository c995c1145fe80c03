//! Persisted login credentials.

use serde::{Deserialize, Serialize};

/// A user's password digest as saved with the board.
///
/// Only the digest is stored. The username is matched without case when the
/// board is reopened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Username as configured.
    pub username: String,
    /// Hex-encoded salted SHA-256 digest.
    pub digest: String,
}
