//! Audit records: one immutable entry per quantity change and its cause.
//!
//! Entries are created once per ledger mutation and never edited afterwards.
//! `resulting_quantity` is the ledger value after the change, so for every
//! entry `previous = resulting_quantity - delta`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// One immutable record of a single quantity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub product: String,
    pub delta: i64,
    pub resulting_quantity: u32,
    pub reason: AuditReason,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry stamped with the current time.
    pub fn now(
        product: impl Into<String>,
        delta: i64,
        resulting_quantity: u32,
        reason: AuditReason,
    ) -> Self {
        Self {
            product: product.into(),
            delta,
            resulting_quantity,
            reason,
            timestamp: Utc::now(),
        }
    }

    /// Builds the entry for a move from `previous` to `resulting`.
    pub fn transition(
        product: impl Into<String>,
        previous: u32,
        resulting: u32,
        reason: AuditReason,
    ) -> Self {
        Self::now(
            product,
            i64::from(resulting) - i64::from(previous),
            resulting,
            reason,
        )
    }
}

/// Why a quantity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditReason {
    /// Operator typed the quantity in.
    ManualUpdate,
    /// Spreadsheet reconciliation raised or lowered an existing product.
    FileImport,
    /// Remote feed reconciliation.
    ApiImport,
    /// Units left the warehouse for an order.
    OrderFulfillment,
    /// Spreadsheet reconciliation introduced a new product.
    FileAdd,
    /// Product disappeared from the spreadsheet.
    FileRemove,
}

impl Display for AuditReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            AuditReason::ManualUpdate => "manual_update",
            AuditReason::FileImport => "file_import",
            AuditReason::ApiImport => "api_import",
            AuditReason::OrderFulfillment => "order_fulfillment",
            AuditReason::FileAdd => "file_add",
            AuditReason::FileRemove => "file_remove",
        };
        f.write_str(tag)
    }
}
