//! Pure data structures shared by the ledger, the reconciler and the audit log.

pub mod audit;
pub mod stock;

pub use audit::*;
pub use stock::*;
