//! Board persistence.
//!
//! The whole board is one [`BoardSnapshot`] document, replaced on every
//! save. [`FilePersistence`] writes it atomically (temp file, fsync,
//! rename); [`MemoryPersistence`] keeps it in memory for tests.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chores_proto::codec::{self, BoardSnapshot, CodecError};
use parking_lot::Mutex;

/// Temporary file suffix for atomic writes.
const TMP_SUFFIX: &str = "tmp";

/// Suffix a corrupted document is moved aside to.
const CORRUPT_SUFFIX: &str = "corrupt";

/// Error type for loading and saving the board.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Filesystem access failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The snapshot could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// An injected failure (test doubles).
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

/// Stores and retrieves the board document.
pub trait BoardPersistence: Send + Sync {
    /// Loads the last saved document, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if storage cannot be read.
    fn load(&self) -> Result<Option<BoardSnapshot>, PersistenceError>;

    /// Replaces the stored document.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the document cannot be written.
    fn save(&self, snapshot: &BoardSnapshot) -> Result<(), PersistenceError>;
}

impl<P: BoardPersistence + ?Sized> BoardPersistence for Arc<P> {
    fn load(&self) -> Result<Option<BoardSnapshot>, PersistenceError> {
        (**self).load()
    }

    fn save(&self, snapshot: &BoardSnapshot) -> Result<(), PersistenceError> {
        (**self).save(snapshot)
    }
}

// --- in-memory ---

/// Keeps the document in memory. Can be told to fail saves.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Option<BoardSnapshot>,
    saves: usize,
    fail_saves: bool,
}

impl MemoryPersistence {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: BoardSnapshot) -> Self {
        let persistence = Self::new();
        persistence.inner.lock().snapshot = Some(snapshot);
        persistence
    }

    /// The last saved document.
    #[must_use]
    pub fn last_saved(&self) -> Option<BoardSnapshot> {
        self.inner.lock().snapshot.clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.inner.lock().saves
    }

    /// Makes subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.inner.lock().fail_saves = fail;
    }
}

impl BoardPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<BoardSnapshot>, PersistenceError> {
        Ok(self.inner.lock().snapshot.clone())
    }

    fn save(&self, snapshot: &BoardSnapshot) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock();
        if inner.fail_saves {
            return Err(PersistenceError::Unavailable("save disabled".to_string()));
        }
        inner.snapshot = Some(snapshot.clone());
        inner.saves += 1;
        Ok(())
    }
}

// --- file ---

/// Stores the document in a single file.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    /// Creates a store backed by `path`. Nothing is touched until the
    /// first load or save.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
        move |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl BoardPersistence for FilePersistence {
    /// A missing file loads as `None`. A file that does not decode is moved
    /// aside with a warning and also loads as `None`.
    fn load(&self) -> Result<Option<BoardSnapshot>, PersistenceError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&self.path)(e)),
        };
        match codec::decode(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                let aside = self.sibling(CORRUPT_SUFFIX);
                tracing::warn!(
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "board document unreadable, starting fresh"
                );
                fs::rename(&self.path, &aside).map_err(Self::io_error(&self.path))?;
                Ok(None)
            }
        }
    }

    fn save(&self, snapshot: &BoardSnapshot) -> Result<(), PersistenceError> {
        let bytes = codec::encode(snapshot)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(Self::io_error(dir))?;
        }

        let tmp_path = self.sibling(TMP_SUFFIX);
        let mut tmp_file = File::create(&tmp_path).map_err(Self::io_error(&tmp_path))?;
        tmp_file
            .write_all(&bytes)
            .and_then(|()| tmp_file.sync_all())
            .map_err(Self::io_error(&tmp_path))?;
        fs::rename(&tmp_path, &self.path).map_err(Self::io_error(&self.path))?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "board saved");
        Ok(())
    }
}
