//! # Change Tracker
//!
//! Pure comparison of two stock snapshots.
//!
//! [`diff`] classifies every product that appears in either snapshot into
//! exactly one of five partitions: added, removed, increased, decreased or
//! unchanged. It performs no I/O and holds no state, so the spreadsheet and the
//! API reconciliation paths share it and it can be tested on plain maps.

use crate::model::StockSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// How many products per category the summary lists before eliding the rest.
const SUMMARY_LIMIT: usize = 5;

/// Old and new quantity of a product whose level moved.
///
/// `delta` is always the absolute difference; the partition it lives in gives
/// the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityChange {
    pub old: u32,
    pub new: u32,
    pub delta: u32,
}

/// The five-way partition of a diff between two stock snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: StockSnapshot,
    pub removed: StockSnapshot,
    pub increased: BTreeMap<String, QuantityChange>,
    pub decreased: BTreeMap<String, QuantityChange>,
    pub unchanged: StockSnapshot,
}

impl ChangeSet {
    /// Number of products that changed in any way (everything but `unchanged`).
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.increased.len() + self.decreased.len()
    }

    /// True when the two snapshots held the same products at the same levels.
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    /// Every product name mentioned in any partition.
    pub fn products(&self) -> impl Iterator<Item = &String> {
        self.added
            .keys()
            .chain(self.removed.keys())
            .chain(self.increased.keys())
            .chain(self.decreased.keys())
            .chain(self.unchanged.keys())
    }

    /// Human-readable lines describing the change, a few items per category.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if !self.added.is_empty() {
            lines.push(format!("Added {} new products", self.added.len()));
            for (product, qty) in self.added.iter().take(SUMMARY_LIMIT) {
                lines.push(format!("   + {product}: {qty} units"));
            }
            if self.added.len() > SUMMARY_LIMIT {
                lines.push(format!("   ... and {} more", self.added.len() - SUMMARY_LIMIT));
            }
        }

        if !self.increased.is_empty() {
            lines.push(format!("Increased {} products", self.increased.len()));
            for (product, change) in self.increased.iter().take(SUMMARY_LIMIT) {
                lines.push(format!(
                    "   ^ {product}: {} -> {} (+{})",
                    change.old, change.new, change.delta
                ));
            }
        }

        if !self.decreased.is_empty() {
            lines.push(format!("Decreased {} products", self.decreased.len()));
            for (product, change) in self.decreased.iter().take(SUMMARY_LIMIT) {
                lines.push(format!(
                    "   v {product}: {} -> {} (-{})",
                    change.old, change.new, change.delta
                ));
            }
        }

        if !self.removed.is_empty() {
            lines.push(format!("Removed {} products", self.removed.len()));
        }

        if !self.unchanged.is_empty() {
            lines.push(format!("Unchanged: {} products", self.unchanged.len()));
        }

        lines
    }
}

impl Display for ChangeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "+{} -{} ^{} v{} ={}",
            self.added.len(),
            self.removed.len(),
            self.increased.len(),
            self.decreased.len(),
            self.unchanged.len()
        )
    }
}

/// Compares two full snapshots.
///
/// For every product in `old` or `new`:
/// - absent from `old` => `added` (with the new quantity)
/// - absent from `new` => `removed` (with the old quantity)
/// - new > old => `increased`
/// - new < old => `decreased`
/// - otherwise => `unchanged`
pub fn diff(old: &StockSnapshot, new: &StockSnapshot) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (product, &old_qty) in old {
        match new.get(product) {
            None => {
                changes.removed.insert(product.clone(), old_qty);
            }
            Some(&new_qty) if new_qty > old_qty => {
                changes.increased.insert(
                    product.clone(),
                    QuantityChange {
                        old: old_qty,
                        new: new_qty,
                        delta: new_qty - old_qty,
                    },
                );
            }
            Some(&new_qty) if new_qty < old_qty => {
                changes.decreased.insert(
                    product.clone(),
                    QuantityChange {
                        old: old_qty,
                        new: new_qty,
                        delta: old_qty - new_qty,
                    },
                );
            }
            Some(&new_qty) => {
                changes.unchanged.insert(product.clone(), new_qty);
            }
        }
    }

    for (product, &new_qty) in new {
        if !old.contains_key(product) {
            changes.added.insert(product.clone(), new_qty);
        }
    }

    changes
}
