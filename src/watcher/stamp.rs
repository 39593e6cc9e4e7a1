use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

/// Last-recorded modification time of the watched spreadsheet.
///
/// Cloning shares the same slot. The watcher reads and updates it on every
/// tick; the spreadsheet writer records its own writes in it so the watcher
/// does not mistake them for external edits.
#[derive(Debug, Clone, Default)]
pub struct ModifiedStamp {
    inner: Arc<Mutex<Option<SystemTime>>>,
}

impl ModifiedStamp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<SystemTime> {
        *self.slot()
    }

    /// Reads the modification time of `path` and stores it.
    ///
    /// Returns the previously recorded stamp together with the new one, or
    /// `None` (leaving the slot alone) if the file cannot be read.
    pub fn observe(&self, path: &Path) -> Option<(Option<SystemTime>, SystemTime)> {
        let mut slot = self.slot();
        let observed = modified_time(path)?;
        Some((slot.replace(observed), observed))
    }

    /// Runs `write` against `path` and records the resulting modification time.
    ///
    /// The slot stays locked for the whole write, so a concurrent
    /// [`observe`](Self::observe) runs entirely before or entirely after it.
    pub fn record_write<T, E>(&self, path: &Path, write: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let mut slot = self.slot();
        let written = write()?;
        if let Some(modified) = modified_time(path) {
            *slot = Some(modified);
        }
        Ok(written)
    }

    fn slot(&self) -> MutexGuard<'_, Option<SystemTime>> {
        // A panic while holding the lock cannot leave a SystemTime half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Modification time of `path`, or `None` if the file is missing or unreadable.
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
