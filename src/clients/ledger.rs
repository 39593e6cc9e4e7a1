use crate::error::StockError;
use crate::model::StockSnapshot;
use async_trait::async_trait;

/// Capability interface of the stock ledger.
///
/// The reconciler, the workflow helpers and the lifecycle code depend on this
/// trait rather than on [`LedgerClient`](crate::clients::LedgerClient), so a
/// test can hand them a mock channel or any other implementation.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current quantity; 0 for unknown products.
    async fn get(&self, product: &str) -> Result<u32, StockError>;

    /// Owned copy of the whole ledger.
    async fn get_all(&self) -> Result<StockSnapshot, StockError>;

    /// Unconditional overwrite. Returns the previous quantity.
    async fn set(&self, product: &str, quantity: u32) -> Result<u32, StockError>;

    /// Merges `items` into the ledger. Products absent from `items` are kept.
    async fn bulk_set(&self, items: StockSnapshot) -> Result<(), StockError>;

    /// Deletes the named products. Returns how many existed.
    async fn remove_many(&self, products: Vec<String>) -> Result<usize, StockError>;

    /// Removes `quantity` units. Returns what is left.
    async fn deduct(&self, product: &str, quantity: u32) -> Result<u32, StockError>;

    /// Deducts every line or none of them. Returns the remaining quantity per line.
    async fn deduct_many(&self, items: Vec<(String, u32)>) -> Result<Vec<(String, u32)>, StockError>;

    /// Increments, creating the product if needed. Returns the new quantity.
    async fn add(&self, product: &str, quantity: u32) -> Result<u32, StockError>;

    /// Forces a save of the current state.
    async fn flush(&self) -> Result<(), StockError>;
}
