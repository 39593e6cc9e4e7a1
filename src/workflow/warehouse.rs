use super::parse::parse_stock_entries;
use crate::audit::AuditLog;
use crate::clients::Ledger;
use crate::error::StockError;
use crate::model::AuditReason;
use tracing::info;

/// Overwrites one quantity and audits it as a manual update.
///
/// Returns the previous quantity.
pub async fn set_item(
    ledger: &dyn Ledger,
    audit: &AuditLog,
    product: &str,
    quantity: u32,
) -> Result<u32, StockError> {
    let previous = ledger.set(product, quantity).await?;
    audit.record(product.trim(), previous, quantity, AuditReason::ManualUpdate);
    Ok(previous)
}

/// Applies an operator's stock entry such as `"Widget: 50, Gear: 0"`.
///
/// Every parsed entry overwrites the ledger value. Returns the entries applied.
pub async fn manual_update(
    ledger: &dyn Ledger,
    audit: &AuditLog,
    text: &str,
) -> Result<Vec<(String, u32)>, StockError> {
    let entries = parse_stock_entries(text);
    if entries.is_empty() {
        return Err(StockError::InvalidQuantity(format!(
            "no valid stock entries in {text:?}"
        )));
    }

    for (product, quantity) in &entries {
        set_item(ledger, audit, product, *quantity).await?;
    }
    info!(entries = entries.len(), "Manual stock update applied");
    Ok(entries)
}
