//! # Audit Log
//!
//! Durable, queryable history of stock changes.
//!
//! Storage sits behind the [`AuditStore`] trait so it can be swapped:
//! [`JsonlAuditStore`] appends one JSON object per line to a file, and
//! [`MemoryAuditStore`] keeps entries in a `Vec` for tests and embedding.
//!
//! [`AuditLog`] is what the rest of the crate holds. Its `append` never fails:
//! a storage error is logged and swallowed so that an audit problem cannot
//! block the stock mutation that triggered it.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlAuditStore;
pub use memory::MemoryAuditStore;

use crate::error::StockError;
use crate::model::{AuditEntry, AuditReason};
use std::sync::Arc;
use tracing::{debug, error};

/// Pluggable append-only store of audit entries.
pub trait AuditStore: Send + Sync {
    /// Persist a single entry.
    fn append(&self, entry: &AuditEntry) -> Result<(), StockError>;

    /// The most recent `limit` entries, in `order`.
    fn query(&self, limit: usize, order: AuditOrder) -> Result<Vec<AuditEntry>, StockError>;

    /// Total number of stored entries.
    fn len(&self) -> Result<usize, StockError>;

    fn is_empty(&self) -> Result<bool, StockError> {
        Ok(self.len()? == 0)
    }
}

/// Ordering of query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuditOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Selects the last `limit` entries of a chronological list and orders them.
pub(crate) fn select_recent(mut entries: Vec<AuditEntry>, limit: usize, order: AuditOrder) -> Vec<AuditEntry> {
    let skip = entries.len().saturating_sub(limit);
    entries.drain(..skip);
    if order == AuditOrder::NewestFirst {
        entries.reverse();
    }
    entries
}

/// Shared handle to the audit store.
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn AuditStore>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// An audit log backed by memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryAuditStore::new()))
    }

    /// Appends one entry. Storage failures are logged, never returned.
    pub fn append(&self, entry: AuditEntry) {
        debug!(
            product = %entry.product,
            delta = entry.delta,
            resulting_quantity = entry.resulting_quantity,
            reason = %entry.reason,
            "Audit"
        );
        if let Err(e) = self.store.append(&entry) {
            error!(product = %entry.product, reason = %entry.reason, error = %e, "Audit append failed");
        }
    }

    /// Records the move of `product` from `previous` to `resulting`.
    pub fn record(&self, product: &str, previous: u32, resulting: u32, reason: AuditReason) {
        self.append(AuditEntry::transition(product, previous, resulting, reason));
    }

    pub fn query(&self, limit: usize, order: AuditOrder) -> Result<Vec<AuditEntry>, StockError> {
        self.store.query(limit, order)
    }

    pub fn len(&self) -> Result<usize, StockError> {
        self.store.len()
    }

    pub fn is_empty(&self) -> Result<bool, StockError> {
        self.store.is_empty()
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    impl AuditStore for FailingStore {
        fn append(&self, _entry: &AuditEntry) -> Result<(), StockError> {
            Err(StockError::PersistenceFailure("disk full".to_string()))
        }

        fn query(&self, _limit: usize, _order: AuditOrder) -> Result<Vec<AuditEntry>, StockError> {
            Ok(Vec::new())
        }

        fn len(&self) -> Result<usize, StockError> {
            Ok(0)
        }
    }

    #[test]
    fn test_append_swallows_store_errors() {
        let log = AuditLog::new(Arc::new(FailingStore));
        log.record("Widget", 1, 2, AuditReason::ManualUpdate);
        assert_eq!(log.len().unwrap(), 0);
    }

    #[test]
    fn test_query_orders_and_limits() {
        let log = AuditLog::in_memory();
        for (i, product) in ["A", "B", "C", "D"].iter().enumerate() {
            log.record(product, 0, i as u32, AuditReason::FileAdd);
        }

        let newest: Vec<String> = log
            .query(2, AuditOrder::NewestFirst)
            .unwrap()
            .into_iter()
            .map(|e| e.product)
            .collect();
        assert_eq!(newest, vec!["D", "C"]);

        let oldest: Vec<String> = log
            .query(3, AuditOrder::OldestFirst)
            .unwrap()
            .into_iter()
            .map(|e| e.product)
            .collect();
        assert_eq!(oldest, vec!["B", "C", "D"]);

        assert_eq!(log.query(0, AuditOrder::NewestFirst).unwrap().len(), 0);
        assert_eq!(log.query(100, AuditOrder::NewestFirst).unwrap().len(), 4);
    }
}
