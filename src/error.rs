//! # Stock Errors
//!
//! A single error type is shared by the ledger, the reconciler and the workflow
//! helpers. Channel-level failures from the actor plumbing are folded into
//! [`StockError::ActorCommunication`].

use crate::framework::FrameworkError;
use thiserror::Error;

/// Errors produced by stock operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StockError {
    /// A deduction (or parsed order line) asked for a non-positive quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Product names must be non-empty after trimming.
    #[error("Invalid product name: {0:?}")]
    InvalidProduct(String),

    /// The product is unknown or holds fewer units than requested.
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },

    /// The external file is missing or the remote feed failed or timed out.
    #[error("Stock source unavailable: {0}")]
    SourceUnavailable(String),

    /// The external source lacks the required columns or keys.
    #[error("Malformed stock source: {0}")]
    MalformedSource(String),

    /// Writing to (or reading from) durable storage failed.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// An order text contained no usable `product: quantity` items.
    #[error("Order contains no valid items")]
    EmptyOrder,

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The ledger actor is gone or dropped the response channel.
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

impl StockError {
    /// Whether the error was caused by the caller's input rather than by the
    /// system. An HTTP layer maps these to 4xx and everything else to 5xx.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StockError::InvalidQuantity(_)
                | StockError::InvalidProduct(_)
                | StockError::InsufficientStock { .. }
                | StockError::MalformedSource(_)
                | StockError::EmptyOrder
        )
    }
}

impl From<FrameworkError> for StockError {
    fn from(e: FrameworkError) -> Self {
        StockError::ActorCommunication(e.to_string())
    }
}
