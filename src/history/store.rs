//! Durable, size-bounded history log.
//!
//! The log is persisted as a single JSON document, newest entry first, and is
//! always rewritten whole. Absent or corrupt data loads as an empty log, so a
//! damaged file can never wedge the calculator.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum number of retained entries; the oldest are evicted past this.
pub const HISTORY_CAPACITY: usize = 50;

/// One past calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The expression as the user entered it.
    pub expression: String,
    /// The rounded numeric result.
    pub result: f64,
}

/// Failure to persist the history log. Read paths never fail; see
/// [`HistoryStore::load_all`].
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to write history log: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode history log: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Whole-log read-modify-write store over a single file.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the platform data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("qcalc").join("history.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted log, newest first.
    ///
    /// An absent file is an empty log; a file that fails to decode is treated
    /// the same (with a warning), never as an error.
    pub fn load_all(&self) -> Vec<HistoryEntry> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "discarding corrupt history log");
                Vec::new()
            }
        }
    }

    /// Insert an entry at the front, evicting past [`HISTORY_CAPACITY`], and
    /// persist the full log.
    pub fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let mut log = self.load_all();
        log.insert(0, entry);
        log.truncate(HISTORY_CAPACITY);
        self.persist(&log)?;
        debug!(len = log.len(), "persisted history entry");
        Ok(())
    }

    /// Remove the persisted log entirely.
    pub fn clear(&self) -> Result<(), HistoryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn persist(&self, log: &[HistoryEntry]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec(log)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}
