//! Durable backing file of the ledger.
//!
//! The file is a flat, pretty-printed JSON object `{ "product": quantity }`.
//! Every save replaces it atomically: the new content goes to a temp file in
//! the same directory, which is then renamed over the old one. A crash mid-save
//! leaves either the old or the new file, never a truncated one.

use crate::error::StockError;
use crate::model::StockSnapshot;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Loads and saves the ledger's snapshot at a fixed path.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted snapshot.
    ///
    /// A missing file is an empty ledger. A file that exists but cannot be
    /// read or parsed is an error: starting empty would overwrite it on the
    /// first mutation.
    pub fn load(&self) -> Result<StockSnapshot, StockError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StockSnapshot::new()),
            Err(e) => {
                return Err(StockError::PersistenceFailure(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(StockSnapshot::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            StockError::PersistenceFailure(format!(
                "failed to parse {}: {e}",
                self.path.display()
            ))
        })
    }

    pub fn save(&self, snapshot: &StockSnapshot) -> Result<(), StockError> {
        let contents = serde_json::to_string_pretty(snapshot)
            .map_err(|e| StockError::PersistenceFailure(format!("failed to render ledger: {e}")))?;
        atomic_write(&self.path, contents.as_bytes())
    }
}

/// Replaces `path` with `data` through a temp file and a rename.
///
/// Parent directories are created as needed. A bare file name is written in
/// the current directory.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StockError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| {
        StockError::PersistenceFailure(format!("failed to create {}: {e}", dir.display()))
    })?;
    let temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        StockError::PersistenceFailure(format!(
            "failed to create temp file in {}: {e}",
            dir.display()
        ))
    })?;
    fs::write(temp.path(), data).map_err(|e| {
        StockError::PersistenceFailure(format!("failed to write temp file: {e}"))
    })?;
    temp.persist(path).map_err(|e| {
        StockError::PersistenceFailure(format!("failed to persist {}: {e}", path.display()))
    })?;
    Ok(())
}
