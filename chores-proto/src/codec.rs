//! The persisted board document and its binary encoding.
//!
//! The whole board is stored as one [`BoardSnapshot`] and rewritten on every
//! mutation. The encoding is postcard behind a one-byte format version:
//!
//! `[u8 version][postcard payload]`
//!
//! Version 1 documents predate saved credentials and still decode, with an
//! empty credential list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::StoredCredential;
use crate::laundry::LaundryReservation;
use crate::task::{QueuedOccurrence, TaskInstance};

/// Current document format version.
pub const SNAPSHOT_VERSION: u8 = 2;

/// Oldest document format version [`decode`] still reads.
pub const MIN_SNAPSHOT_VERSION: u8 = 1;

/// Error type for document encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Input is empty.
    #[error("empty document")]
    Empty,
    /// The document was written by an incompatible version.
    #[error("unsupported document version {found} (supported: {MIN_SNAPSHOT_VERSION} to {SNAPSHOT_VERSION})")]
    UnsupportedVersion {
        /// Version byte found in the input.
        found: u8,
    },
}

/// Everything the board persists, replaced as a whole on every save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// One live instance per task definition.
    pub tasks: Vec<TaskInstance>,
    /// Next occurrences waiting for a rollover.
    pub queued: Vec<QueuedOccurrence>,
    /// Laundry bookings.
    pub reservations: Vec<LaundryReservation>,
    /// When the rollover checker last ran.
    pub last_rollover_check: Option<DateTime<Utc>>,
    /// Password digests changed since the household was configured.
    pub credentials: Vec<StoredCredential>,
}

/// Layout of a version 1 document.
#[derive(Deserialize)]
struct SnapshotV1 {
    tasks: Vec<TaskInstance>,
    queued: Vec<QueuedOccurrence>,
    reservations: Vec<LaundryReservation>,
    last_rollover_check: Option<DateTime<Utc>>,
}

impl From<SnapshotV1> for BoardSnapshot {
    fn from(v1: SnapshotV1) -> Self {
        Self {
            tasks: v1.tasks,
            queued: v1.queued,
            reservations: v1.reservations,
            last_rollover_check: v1.last_rollover_check,
            credentials: Vec::new(),
        }
    }
}

/// Encodes a [`BoardSnapshot`] with its version prefix.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the snapshot cannot be serialized.
pub fn encode(snapshot: &BoardSnapshot) -> Result<Vec<u8>, CodecError> {
    let payload =
        postcard::to_allocvec(snapshot).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let mut bytes = Vec::with_capacity(1 + payload.len());
    bytes.push(SNAPSHOT_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes a versioned [`BoardSnapshot`].
///
/// # Errors
///
/// Returns `CodecError::Empty` for empty input,
/// `CodecError::UnsupportedVersion` for a foreign version byte, or
/// `CodecError::Serialization` if the payload cannot be deserialized.
pub fn decode(bytes: &[u8]) -> Result<BoardSnapshot, CodecError> {
    let (&version, payload) = bytes.split_first().ok_or(CodecError::Empty)?;
    match version {
        SNAPSHOT_VERSION => {
            postcard::from_bytes(payload).map_err(|e| CodecError::Serialization(e.to_string()))
        }
        MIN_SNAPSHOT_VERSION => postcard::from_bytes::<SnapshotV1>(payload)
            .map(BoardSnapshot::from)
            .map_err(|e| CodecError::Serialization(e.to_string())),
        found => Err(CodecError::UnsupportedVersion { found }),
    }
}
