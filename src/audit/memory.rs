use super::{select_recent, AuditOrder, AuditStore};
use crate::error::StockError;
use crate::model::AuditEntry;
use std::sync::{Mutex, MutexGuard};

/// Audit store that lives in memory and is lost on exit.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, Vec<AuditEntry>>, StockError> {
        self.entries
            .lock()
            .map_err(|_| StockError::PersistenceFailure("audit store lock poisoned".to_string()))
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&self, entry: &AuditEntry) -> Result<(), StockError> {
        self.entries()?.push(entry.clone());
        Ok(())
    }

    fn query(&self, limit: usize, order: AuditOrder) -> Result<Vec<AuditEntry>, StockError> {
        let entries = self.entries()?.clone();
        Ok(select_recent(entries, limit, order))
    }

    fn len(&self) -> Result<usize, StockError> {
        Ok(self.entries()?.len())
    }
}
