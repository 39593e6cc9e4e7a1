//! Handles used by the rest of the crate to reach the ledger actor.

pub mod ledger;
pub mod ledger_client;

pub use ledger::*;
pub use ledger_client::*;
