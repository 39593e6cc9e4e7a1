//! # Mock Framework
//!
//! Utilities for testing ledger clients in isolation.
//!
//! Use [`create_mock_ledger`] to get a client and the receiver end of its
//! mailbox. Then use helpers like [`expect_get_all`] or [`expect_bulk_set`] to
//! assert what the client sent and to answer on its behalf.

use crate::clients::LedgerClient;
use crate::error::StockError;
use crate::framework::Response;
use crate::ledger_actor::LedgerRequest;
use crate::model::StockSnapshot;
use tokio::sync::mpsc;

/// Creates a ledger client whose requests land on a receiver the test controls.
///
/// # Testing Strategy
/// When testing code that *uses* the ledger (the reconciler, the workflow
/// helpers) there is no need to spin up a real [`LedgerActor`](crate::ledger_actor::LedgerActor).
/// The test plays the actor instead: it pulls each request off `receiver`,
/// checks it, and answers through the responder. Success, failure and odd
/// orderings can all be simulated deterministically.
pub fn create_mock_ledger(buffer_size: usize) -> (LedgerClient, mpsc::Receiver<LedgerRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (LedgerClient::new(sender), receiver)
}

/// Returns the next request, whatever it is.
pub async fn expect_request(receiver: &mut mpsc::Receiver<LedgerRequest>) -> Option<LedgerRequest> {
    receiver.recv().await
}

/// Helper to verify that the next message is a GetAll request
pub async fn expect_get_all(
    receiver: &mut mpsc::Receiver<LedgerRequest>,
) -> Option<Response<StockSnapshot, StockError>> {
    match receiver.recv().await {
        Some(LedgerRequest::GetAll { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next message is a BulkSet request
pub async fn expect_bulk_set(
    receiver: &mut mpsc::Receiver<LedgerRequest>,
) -> Option<(StockSnapshot, Response<(), StockError>)> {
    match receiver.recv().await {
        Some(LedgerRequest::BulkSet { items, respond_to }) => Some((items, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a DeductMany request
pub async fn expect_deduct_many(
    receiver: &mut mpsc::Receiver<LedgerRequest>,
) -> Option<(Vec<(String, u32)>, Response<Vec<(String, u32)>, StockError>)> {
    match receiver.recv().await {
        Some(LedgerRequest::DeductMany { items, respond_to }) => Some((items, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Set request
pub async fn expect_set(
    receiver: &mut mpsc::Receiver<LedgerRequest>,
) -> Option<(String, u32, Response<u32, StockError>)> {
    match receiver.recv().await {
        Some(LedgerRequest::Set {
            product,
            quantity,
            respond_to,
        }) => Some((product, quantity, respond_to)),
        _ => None,
    }
}
