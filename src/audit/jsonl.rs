//! Append-only JSON-lines audit file.
//!
//! One [`AuditEntry`] per line. Lines are only ever appended; nothing rewrites
//! or truncates the file. A line that fails to parse (a torn write, a manual
//! edit) is skipped with a warning when reading.

use super::{select_recent, AuditOrder, AuditStore};
use crate::error::StockError;
use crate::model::AuditEntry;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

#[derive(Debug)]
pub struct JsonlAuditStore {
    path: PathBuf,
    // Serializes appends from concurrent callers so lines never interleave.
    write_lock: Mutex<()>,
}

impl JsonlAuditStore {
    /// Opens (creating if needed) the audit file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StockError> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                StockError::PersistenceFailure(format!("failed to create {}: {e}", dir.display()))
            })?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                StockError::PersistenceFailure(format!("failed to open {}: {e}", path.display()))
            })?;
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<AuditEntry>, StockError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StockError::PersistenceFailure(format!(
                    "failed to open {}: {e}",
                    self.path.display()
                )))
            }
        };

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                StockError::PersistenceFailure(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                ))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(line = index + 1, error = %e, "Skipping corrupt audit line"),
            }
        }
        Ok(entries)
    }
}

impl AuditStore for JsonlAuditStore {
    fn append(&self, entry: &AuditEntry) -> Result<(), StockError> {
        let mut line = serde_json::to_string(entry)
            .map_err(|e| StockError::PersistenceFailure(format!("failed to render audit entry: {e}")))?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StockError::PersistenceFailure("audit file lock poisoned".to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                StockError::PersistenceFailure(format!("failed to open {}: {e}", self.path.display()))
            })?;
        file.write_all(line.as_bytes()).map_err(|e| {
            StockError::PersistenceFailure(format!("failed to append to {}: {e}", self.path.display()))
        })
    }

    fn query(&self, limit: usize, order: AuditOrder) -> Result<Vec<AuditEntry>, StockError> {
        Ok(select_recent(self.read_all()?, limit, order))
    }

    fn len(&self) -> Result<usize, StockError> {
        Ok(self.read_all()?.len())
    }
}
