//! Order fulfillment: stock leaves the warehouse.
//!
//! The whole order is deducted in one ledger request, so either every line is
//! taken or none is. After success the spreadsheet is rewritten from the
//! ledger so operators see the new levels; a failed rewrite is logged and does
//! not undo the fulfillment.

use super::parse::parse_order_items;
use crate::audit::AuditLog;
use crate::clients::Ledger;
use crate::error::StockError;
use crate::model::AuditReason;
use crate::reconciler::SpreadsheetSource;
use serde::Serialize;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FulfilledLine {
    pub product: String,
    pub quantity: u32,
    pub remaining: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Fulfillment {
    pub lines: Vec<FulfilledLine>,
}

impl Fulfillment {
    pub fn units(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

/// Deducts one product and audits it as order fulfillment.
///
/// Returns the remaining quantity.
pub async fn deduct_item(
    ledger: &dyn Ledger,
    audit: &AuditLog,
    product: &str,
    quantity: u32,
) -> Result<u32, StockError> {
    let remaining = ledger.deduct(product, quantity).await?;
    audit.record(
        product.trim(),
        remaining + quantity,
        remaining,
        AuditReason::OrderFulfillment,
    );
    Ok(remaining)
}

/// Fulfills an order text such as `"Widget: 5, Gear: 2"`.
///
/// Fails with `EmptyOrder` if no line parses and with `InsufficientStock` (or
/// `InvalidQuantity`) if any line cannot be covered; nothing is deducted then.
#[instrument(skip(ledger, audit, sheet))]
pub async fn fulfill_order(
    ledger: &dyn Ledger,
    audit: &AuditLog,
    sheet: Option<&SpreadsheetSource>,
    text: &str,
) -> Result<Fulfillment, StockError> {
    let items = parse_order_items(text);
    if items.is_empty() {
        return Err(StockError::EmptyOrder);
    }

    let remaining = ledger.deduct_many(items.clone()).await?;
    let lines: Vec<FulfilledLine> = items
        .into_iter()
        .zip(remaining)
        .map(|((_, quantity), (product, remaining))| FulfilledLine {
            product,
            quantity,
            remaining,
        })
        .collect();

    for line in &lines {
        audit.record(
            &line.product,
            line.remaining + line.quantity,
            line.remaining,
            AuditReason::OrderFulfillment,
        );
    }
    let fulfillment = Fulfillment { lines };
    info!(lines = fulfillment.lines.len(), units = fulfillment.units(), "Order fulfilled");

    if let Some(sheet) = sheet {
        write_back(ledger, sheet).await;
    }
    Ok(fulfillment)
}

async fn write_back(ledger: &dyn Ledger, sheet: &SpreadsheetSource) {
    let result = match ledger.get_all().await {
        Ok(stock) => {
            let writer = sheet.clone();
            tokio::task::spawn_blocking(move || writer.write_stock(&stock))
                .await
                .unwrap_or_else(|e| {
                    Err(StockError::PersistenceFailure(format!(
                        "spreadsheet write task failed: {e}"
                    )))
                })
        }
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!(path = %sheet.path().display(), error = %e, "Spreadsheet write-back failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditOrder;
    use crate::framework::mock::{create_mock_ledger, expect_deduct_many};
    use crate::ledger_actor::{self, LedgerStore};
    use crate::watcher::ModifiedStamp;

    #[tokio::test]
    async fn test_fulfill_writes_back_and_audits() {
        let dir = tempfile::tempdir().unwrap();
        let (actor, ledger) =
            ledger_actor::new(LedgerStore::new(dir.path().join("stock.json")), 8).unwrap();
        tokio::spawn(actor.run());
        ledger.set("Widget", 10).await.unwrap();
        ledger.set("Gear", 2).await.unwrap();

        let audit = AuditLog::in_memory();
        let stamp = ModifiedStamp::new();
        let sheet = SpreadsheetSource::new(dir.path().join("stock.csv"), stamp.clone());

        let done = fulfill_order(&ledger, &audit, Some(&sheet), "Widget: 4, Gear: 2")
            .await
            .unwrap();
        assert_eq!(done.units(), 6);
        assert_eq!(done.lines[1].remaining, 0);

        let written = sheet.read_stock().unwrap();
        assert_eq!(written.get("Widget"), Some(&6));
        assert_eq!(written.get("Gear"), Some(&0));
        assert!(stamp.get().is_some());

        let entries = audit.query(10, AuditOrder::OldestFirst).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!((entries[0].delta, entries[0].resulting_quantity), (-4, 6));
        assert_eq!(entries[1].reason, AuditReason::OrderFulfillment);
    }

    #[tokio::test]
    async fn test_insufficient_line_deducts_nothing() {
        let (client, mut receiver) = create_mock_ledger(10);
        let audit = AuditLog::in_memory();
        let task_audit = audit.clone();

        let task = tokio::spawn(async move {
            fulfill_order(&client, &task_audit, None, "Widget: 1, Gear: 9").await
        });

        let (items, responder) = expect_deduct_many(&mut receiver).await.unwrap();
        assert_eq!(items.len(), 2);
        responder
            .send(Err(StockError::InsufficientStock {
                product: "Gear".to_string(),
                requested: 9,
                available: 2,
            }))
            .unwrap();

        assert!(matches!(
            task.await.unwrap(),
            Err(StockError::InsufficientStock { .. })
        ));
        assert!(audit.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_overflowing_order_leaves_ledger_running() {
        let dir = tempfile::tempdir().unwrap();
        let (actor, ledger) =
            ledger_actor::new(LedgerStore::new(dir.path().join("stock.json")), 8).unwrap();
        tokio::spawn(actor.run());
        ledger.set("A", u32::MAX).await.unwrap();
        let audit = AuditLog::in_memory();

        let result = fulfill_order(&ledger, &audit, None, "A: 4294967295, A: 1").await;
        assert!(matches!(result, Err(StockError::InvalidQuantity(_))));
        assert_eq!(ledger.get("A").await.unwrap(), u32::MAX);
        assert!(audit.is_empty().unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_write_back_keeps_fulfillment() {
        let dir = tempfile::tempdir().unwrap();
        let (actor, ledger) =
            ledger_actor::new(LedgerStore::new(dir.path().join("stock.json")), 8).unwrap();
        tokio::spawn(actor.run());
        ledger.set("Widget", 3).await.unwrap();

        // The spreadsheet's parent is a regular file, so the write fails.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let stamp = ModifiedStamp::new();
        let sheet = SpreadsheetSource::new(blocker.join("stock.csv"), stamp.clone());

        let done = fulfill_order(&ledger, &AuditLog::in_memory(), Some(&sheet), "Widget: 1")
            .await
            .unwrap();
        assert_eq!(done.lines[0].remaining, 2);
        assert_eq!(ledger.get("Widget").await.unwrap(), 2);
        assert_eq!(stamp.get(), None);
    }

    #[tokio::test]
    async fn test_empty_order() {
        let (client, _receiver) = create_mock_ledger(10);
        let result = fulfill_order(&client, &AuditLog::in_memory(), None, "thanks!").await;
        assert_eq!(result, Err(StockError::EmptyOrder));
    }
}
