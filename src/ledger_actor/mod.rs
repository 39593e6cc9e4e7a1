//! The stock ledger: sole owner of current stock truth.
//!
//! # Architecture Note
//! [`LedgerActor`] is the "Server" half. It owns the `product -> quantity` map
//! and its [`LedgerStore`], and processes [`LedgerRequest`]s one at a time.
//! Every read-modify-persist sequence therefore runs without interleaving:
//! a `get` sees either the state before a mutation or after it, and two
//! deductions of the last unit cannot both succeed. No `Mutex` is involved.
//!
//! Callers talk to it through the cloneable [`LedgerClient`].

mod actions;
pub mod store;

pub use actions::*;
pub use store::LedgerStore;

use crate::clients::LedgerClient;
use crate::error::StockError;
use crate::model::{normalize_product, StockSnapshot};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Loads the persisted ledger and creates its actor and client.
///
/// Fails with [`StockError::PersistenceFailure`] if the backing file exists
/// but cannot be read.
pub fn new(store: LedgerStore, buffer_size: usize) -> Result<(LedgerActor, LedgerClient), StockError> {
    let stock = store.load()?;
    let (sender, receiver) = mpsc::channel(buffer_size);
    let actor = LedgerActor {
        receiver,
        stock,
        store,
    };
    Ok((actor, LedgerClient::new(sender)))
}

pub struct LedgerActor {
    receiver: mpsc::Receiver<LedgerRequest>,
    stock: StockSnapshot,
    store: LedgerStore,
}

impl LedgerActor {
    /// Runs the actor's event loop until every client has been dropped.
    pub async fn run(mut self) {
        info!(
            path = %self.store.path().display(),
            size = self.stock.len(),
            "Ledger actor started"
        );

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                LedgerRequest::Get {
                    product,
                    respond_to,
                } => {
                    let quantity = self.stock.get(product.trim()).copied().unwrap_or(0);
                    debug!(%product, quantity, "Get");
                    let _ = respond_to.send(Ok(quantity));
                }
                LedgerRequest::GetAll { respond_to } => {
                    debug!(size = self.stock.len(), "GetAll");
                    let _ = respond_to.send(Ok(self.stock.clone()));
                }
                LedgerRequest::Set {
                    product,
                    quantity,
                    respond_to,
                } => {
                    let result = self.set(&product, quantity);
                    match &result {
                        Ok(previous) => info!(%product, previous, quantity, "Set"),
                        Err(e) => warn!(%product, error = %e, "Set failed"),
                    }
                    let _ = respond_to.send(result);
                }
                LedgerRequest::BulkSet { items, respond_to } => {
                    let result = self.bulk_set(items);
                    match &result {
                        Ok(()) => info!(size = self.stock.len(), "BulkSet"),
                        Err(e) => warn!(error = %e, "BulkSet failed"),
                    }
                    let _ = respond_to.send(result);
                }
                LedgerRequest::RemoveMany {
                    products,
                    respond_to,
                } => {
                    let removed = self.remove_many(&products);
                    info!(removed, size = self.stock.len(), "RemoveMany");
                    let _ = respond_to.send(Ok(removed));
                }
                LedgerRequest::Deduct {
                    product,
                    quantity,
                    respond_to,
                } => {
                    let result = self.deduct(&product, quantity);
                    match &result {
                        Ok(remaining) => info!(%product, quantity, remaining, "Deducted"),
                        Err(e) => warn!(%product, quantity, error = %e, "Deduct rejected"),
                    }
                    let _ = respond_to.send(result);
                }
                LedgerRequest::DeductMany { items, respond_to } => {
                    debug!(?items, "DeductMany");
                    let result = self.deduct_many(items);
                    match &result {
                        Ok(lines) => info!(lines = lines.len(), "Deducted batch"),
                        Err(e) => warn!(error = %e, "Batch deduct rejected"),
                    }
                    let _ = respond_to.send(result);
                }
                LedgerRequest::Add {
                    product,
                    quantity,
                    respond_to,
                } => {
                    let result = self.add(&product, quantity);
                    match &result {
                        Ok(new_quantity) => info!(%product, quantity, new_quantity, "Added"),
                        Err(e) => warn!(%product, error = %e, "Add failed"),
                    }
                    let _ = respond_to.send(result);
                }
                LedgerRequest::Flush { respond_to } => {
                    let result = self.store.save(&self.stock);
                    if let Err(e) = &result {
                        warn!(error = %e, "Flush failed");
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(size = self.stock.len(), "Shutdown");
    }

    fn set(&mut self, product: &str, quantity: u32) -> Result<u32, StockError> {
        let product = normalize_product(product)?;
        let previous = self.stock.insert(product, quantity).unwrap_or(0);
        self.persist();
        Ok(previous)
    }

    fn bulk_set(&mut self, items: StockSnapshot) -> Result<(), StockError> {
        // Validate every name before touching the map.
        let items = items
            .into_iter()
            .map(|(product, quantity)| Ok((normalize_product(&product)?, quantity)))
            .collect::<Result<Vec<_>, StockError>>()?;
        self.stock.extend(items);
        self.persist();
        Ok(())
    }

    fn remove_many(&mut self, products: &[String]) -> usize {
        let removed = products
            .iter()
            .filter(|product| self.stock.remove(product.trim()).is_some())
            .count();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    fn deduct(&mut self, product: &str, quantity: u32) -> Result<u32, StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity(format!(
                "deduction of {quantity} from {product}"
            )));
        }
        let product = product.trim();
        let available = self.stock.get(product).copied();
        match available {
            Some(available) if available >= quantity => {
                let remaining = available - quantity;
                self.stock.insert(product.to_string(), remaining);
                self.persist();
                Ok(remaining)
            }
            _ => Err(StockError::InsufficientStock {
                product: product.to_string(),
                requested: quantity,
                available: available.unwrap_or(0),
            }),
        }
    }

    fn deduct_many(&mut self, items: Vec<(String, u32)>) -> Result<Vec<(String, u32)>, StockError> {
        // Lines naming the same product are checked against their sum.
        let mut requested: BTreeMap<&str, u32> = BTreeMap::new();
        for (product, quantity) in &items {
            if *quantity == 0 {
                return Err(StockError::InvalidQuantity(format!(
                    "deduction of {quantity} from {product}"
                )));
            }
            let total = requested.entry(product.trim()).or_insert(0);
            *total = total.checked_add(*quantity).ok_or_else(|| {
                StockError::InvalidQuantity(format!(
                    "order for {} exceeds {} units",
                    product.trim(),
                    u32::MAX
                ))
            })?;
        }
        for (product, total) in &requested {
            let available = self.stock.get(*product).copied();
            if available.map_or(true, |available| available < *total) {
                return Err(StockError::InsufficientStock {
                    product: product.to_string(),
                    requested: *total,
                    available: available.unwrap_or(0),
                });
            }
        }

        let mut remaining = Vec::with_capacity(items.len());
        for (product, quantity) in items {
            let product = product.trim().to_string();
            // Every product covers the sum of its lines, so this cannot underflow.
            let left = self.stock.get(&product).copied().unwrap_or(0) - quantity;
            self.stock.insert(product.clone(), left);
            remaining.push((product, left));
        }
        if !remaining.is_empty() {
            self.persist();
        }
        Ok(remaining)
    }

    fn add(&mut self, product: &str, quantity: u32) -> Result<u32, StockError> {
        let product = normalize_product(product)?;
        let current = self.stock.get(&product).copied().unwrap_or(0);
        let new_quantity = current.checked_add(quantity).ok_or_else(|| {
            StockError::InvalidQuantity(format!("{product} would exceed {}", u32::MAX))
        })?;
        self.stock.insert(product, new_quantity);
        self.persist();
        Ok(new_quantity)
    }

    /// Saves after a mutation. The in-memory state stays authoritative if the
    /// write fails.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.stock) {
            warn!(path = %self.store.path().display(), error = %e, "Persist failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::Ledger;
    use proptest::prelude::*;

    fn spawn_ledger(dir: &tempfile::TempDir) -> (LedgerClient, tokio::task::JoinHandle<()>) {
        let store = LedgerStore::new(dir.path().join("stock.json"));
        let (actor, client) = new(store, 8).unwrap();
        (client, tokio::spawn(actor.run()))
    }

    #[tokio::test]
    async fn test_set_get_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let (client, handle) = spawn_ledger(&dir);

        assert_eq!(client.get("Widget").await.unwrap(), 0);
        assert_eq!(client.set("Widget", 10).await.unwrap(), 0);
        assert_eq!(client.set("Widget", 7).await.unwrap(), 10);
        assert_eq!(client.get("Widget").await.unwrap(), 7);

        drop(client);
        handle.await.unwrap();

        let reloaded = LedgerStore::new(dir.path().join("stock.json")).load().unwrap();
        assert_eq!(reloaded.get("Widget"), Some(&7));
    }

    #[tokio::test]
    async fn test_deduct_rules() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _handle) = spawn_ledger(&dir);
        client.set("Widget", 2).await.unwrap();

        let err = client.deduct("Widget", 3).await.unwrap_err();
        assert_eq!(
            err,
            StockError::InsufficientStock {
                product: "Widget".to_string(),
                requested: 3,
                available: 2
            }
        );
        assert_eq!(client.get("Widget").await.unwrap(), 2);

        assert!(matches!(
            client.deduct("Widget", 0).await,
            Err(StockError::InvalidQuantity(_))
        ));
        assert!(matches!(
            client.deduct("Unknown", 1).await,
            Err(StockError::InsufficientStock { available: 0, .. })
        ));

        assert_eq!(client.deduct("Widget", 2).await.unwrap(), 0);
        // Product stays known at zero.
        assert_eq!(client.get_all().await.unwrap().get("Widget"), Some(&0));
    }

    #[tokio::test]
    async fn test_deduct_many_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _handle) = spawn_ledger(&dir);
        client.set("A", 5).await.unwrap();
        client.set("B", 1).await.unwrap();

        let result = client
            .deduct_many(vec![("A".to_string(), 3), ("B".to_string(), 2)])
            .await;
        assert!(matches!(result, Err(StockError::InsufficientStock { .. })));
        assert_eq!(client.get("A").await.unwrap(), 5);

        // Two lines for the same product are checked against their sum.
        let result = client
            .deduct_many(vec![("A".to_string(), 3), ("A".to_string(), 3)])
            .await;
        assert!(result.is_err());

        let remaining = client
            .deduct_many(vec![("A".to_string(), 3), ("B".to_string(), 1)])
            .await
            .unwrap();
        assert_eq!(remaining, vec![("A".to_string(), 2), ("B".to_string(), 0)]);
    }

    #[tokio::test]
    async fn test_deduct_many_rejects_overflowing_total() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _handle) = spawn_ledger(&dir);
        client.set("A", u32::MAX).await.unwrap();

        let result = client
            .deduct_many(vec![("A".to_string(), u32::MAX), ("A".to_string(), 1)])
            .await;
        assert!(matches!(result, Err(StockError::InvalidQuantity(_))));

        // The actor is still alive and nothing was taken.
        assert_eq!(client.get("A").await.unwrap(), u32::MAX);
        assert_eq!(
            client.deduct_many(vec![("A".to_string(), u32::MAX)]).await.unwrap(),
            vec![("A".to_string(), 0)]
        );
    }

    #[tokio::test]
    async fn test_bulk_set_merges() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _handle) = spawn_ledger(&dir);
        client.set("A", 10).await.unwrap();
        client.set("B", 5).await.unwrap();

        let items: StockSnapshot = [("A".to_string(), 15), ("C".to_string(), 3)].into();
        client.bulk_set(items).await.unwrap();

        let expected: StockSnapshot = [
            ("A".to_string(), 15),
            ("B".to_string(), 5),
            ("C".to_string(), 3),
        ]
        .into();
        assert_eq!(client.get_all().await.unwrap(), expected);

        assert_eq!(
            client.remove_many(vec!["B".to_string(), "Z".to_string()]).await.unwrap(),
            1
        );
        assert_eq!(client.get("B").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_and_invalid_names() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _handle) = spawn_ledger(&dir);

        assert_eq!(client.add("Gear", 4).await.unwrap(), 4);
        assert_eq!(client.add(" Gear ", 6).await.unwrap(), 10);
        assert!(matches!(
            client.set("  ", 1).await,
            Err(StockError::InvalidProduct(_))
        ));
        assert!(matches!(
            client.add("Gear", u32::MAX).await,
            Err(StockError::InvalidQuantity(_))
        ));
        assert_eq!(client.get("Gear").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let result = new(LedgerStore::new(&path), 8);
        assert!(matches!(result, Err(StockError::PersistenceFailure(_))));
    }

    #[tokio::test]
    async fn test_flush_surfaces_persistence_failure() {
        let dir = tempfile::tempdir().unwrap();
        // The parent "directory" is a regular file, so every save fails.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = LedgerStore::new(blocker.join("stock.json"));
        let (actor, client) = new(store, 8).unwrap();
        tokio::spawn(actor.run());

        // The mutation stands even though the save failed.
        client.set("Widget", 3).await.unwrap();
        assert_eq!(client.get("Widget").await.unwrap(), 3);
        assert!(matches!(
            client.flush().await,
            Err(StockError::PersistenceFailure(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_set_then_get(quantity in 0u32..10_000) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let dir = tempfile::tempdir().unwrap();
                let (client, _handle) = spawn_ledger(&dir);
                client.set("P", quantity).await.unwrap();
                assert_eq!(client.get("P").await.unwrap(), quantity);
            });
        }

        #[test]
        fn prop_deduct_never_goes_negative(start in 0u32..100, amount in 1u32..200) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let dir = tempfile::tempdir().unwrap();
                let (client, _handle) = spawn_ledger(&dir);
                client.set("P", start).await.unwrap();
                let result = client.deduct("P", amount).await;
                if amount <= start {
                    assert_eq!(result, Ok(start - amount));
                    assert_eq!(client.get("P").await.unwrap(), start - amount);
                } else {
                    assert!(matches!(result, Err(StockError::InsufficientStock { .. })));
                    assert_eq!(client.get("P").await.unwrap(), start);
                }
            });
        }

        #[test]
        fn prop_deduct_many_near_the_limit(
            available in (u32::MAX - 8)..=u32::MAX,
            first in (u32::MAX - 8)..=u32::MAX,
            second in 0u32..=8,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let dir = tempfile::tempdir().unwrap();
                let (client, _handle) = spawn_ledger(&dir);
                client.set("P", available).await.unwrap();

                let result = client
                    .deduct_many(vec![("P".to_string(), first), ("P".to_string(), second)])
                    .await;
                let total = u64::from(first) + u64::from(second);
                if second > 0 && total <= u64::from(available) {
                    let left = available - first - second;
                    assert_eq!(result.unwrap().last(), Some(&("P".to_string(), left)));
                    assert_eq!(client.get("P").await.unwrap(), left);
                } else {
                    assert!(result.is_err());
                    assert_eq!(client.get("P").await.unwrap(), available);
                }
            });
        }
    }
}
