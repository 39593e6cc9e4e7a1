use crate::error::StockError;
use std::collections::BTreeMap;

/// A full `product -> quantity` view of the stock.
///
/// A `BTreeMap` keeps iteration (and therefore the persisted file, the change
/// summaries and the audit trail of a reconciliation) in a stable order.
pub type StockSnapshot = BTreeMap<String, u32>;

/// Trims a product name and rejects it if nothing is left.
pub fn normalize_product(product: &str) -> Result<String, StockError> {
    let trimmed = product.trim();
    if trimmed.is_empty() {
        return Err(StockError::InvalidProduct(product.to_string()));
    }
    Ok(trimmed.to_string())
}
