//! # Ledger Client
//!
//! Provides a high-level API for interacting with the ledger actor.
//! It wraps the actor's mailbox and turns every [`Ledger`] call into one
//! [`LedgerRequest`].
use crate::clients::Ledger;
use crate::error::StockError;
use crate::framework::ask;
use crate::ledger_actor::LedgerRequest;
use crate::model::StockSnapshot;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Client for interacting with the ledger actor.
#[derive(Clone)]
pub struct LedgerClient {
    sender: mpsc::Sender<LedgerRequest>,
}

impl LedgerClient {
    pub fn new(sender: mpsc::Sender<LedgerRequest>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Ledger for LedgerClient {
    #[instrument(skip(self))]
    async fn get(&self, product: &str) -> Result<u32, StockError> {
        let product = product.to_string();
        ask(&self.sender, |respond_to| LedgerRequest::Get {
            product,
            respond_to,
        })
        .await?
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<StockSnapshot, StockError> {
        ask(&self.sender, |respond_to| LedgerRequest::GetAll { respond_to }).await?
    }

    #[instrument(skip(self))]
    async fn set(&self, product: &str, quantity: u32) -> Result<u32, StockError> {
        debug!("Sending request");
        let product = product.to_string();
        ask(&self.sender, |respond_to| LedgerRequest::Set {
            product,
            quantity,
            respond_to,
        })
        .await?
    }

    #[instrument(skip(self, items), fields(size = items.len()))]
    async fn bulk_set(&self, items: StockSnapshot) -> Result<(), StockError> {
        debug!(?items, "Sending request");
        ask(&self.sender, |respond_to| LedgerRequest::BulkSet { items, respond_to }).await?
    }

    #[instrument(skip(self))]
    async fn remove_many(&self, products: Vec<String>) -> Result<usize, StockError> {
        ask(&self.sender, |respond_to| LedgerRequest::RemoveMany {
            products,
            respond_to,
        })
        .await?
    }

    #[instrument(skip(self))]
    async fn deduct(&self, product: &str, quantity: u32) -> Result<u32, StockError> {
        debug!("Sending request");
        let product = product.to_string();
        ask(&self.sender, |respond_to| LedgerRequest::Deduct {
            product,
            quantity,
            respond_to,
        })
        .await?
    }

    #[instrument(skip(self))]
    async fn deduct_many(&self, items: Vec<(String, u32)>) -> Result<Vec<(String, u32)>, StockError> {
        ask(&self.sender, |respond_to| LedgerRequest::DeductMany { items, respond_to }).await?
    }

    #[instrument(skip(self))]
    async fn add(&self, product: &str, quantity: u32) -> Result<u32, StockError> {
        let product = product.to_string();
        ask(&self.sender, |respond_to| LedgerRequest::Add {
            product,
            quantity,
            respond_to,
        })
        .await?
    }

    #[instrument(skip(self))]
    async fn flush(&self) -> Result<(), StockError> {
        ask(&self.sender, |respond_to| LedgerRequest::Flush { respond_to }).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{create_mock_ledger, expect_request};

    #[tokio::test]
    async fn test_deduct_sends_request_and_returns_remaining() {
        let (client, mut receiver) = create_mock_ledger(10);

        let task = tokio::spawn(async move { client.deduct("Widget", 3).await });

        match expect_request(&mut receiver).await {
            Some(LedgerRequest::Deduct {
                product,
                quantity,
                respond_to,
            }) => {
                assert_eq!(product, "Widget");
                assert_eq!(quantity, 3);
                respond_to.send(Ok(7)).unwrap();
            }
            other => panic!("Expected Deduct request, got {other:?}"),
        }

        assert_eq!(task.await.unwrap(), Ok(7));
    }

    #[tokio::test]
    async fn test_domain_error_passes_through() {
        let (client, mut receiver) = create_mock_ledger(10);

        let task = tokio::spawn(async move { client.deduct("Widget", 5).await });

        let Some(LedgerRequest::Deduct { respond_to, .. }) = expect_request(&mut receiver).await
        else {
            panic!("Expected Deduct request");
        };
        let error = StockError::InsufficientStock {
            product: "Widget".to_string(),
            requested: 5,
            available: 2,
        };
        respond_to.send(Err(error.clone())).unwrap();

        assert_eq!(task.await.unwrap(), Err(error));
    }

    #[tokio::test]
    async fn test_closed_actor_maps_to_communication_error() {
        let (client, receiver) = create_mock_ledger(10);
        drop(receiver);

        let result = client.get_all().await;
        assert!(matches!(result, Err(StockError::ActorCommunication(_))));
    }

    #[tokio::test]
    async fn test_dropped_responder_maps_to_communication_error() {
        let (client, mut receiver) = create_mock_ledger(10);

        let task = tokio::spawn(async move { client.set("Widget", 1).await });

        // Drop the responder without answering.
        let request = expect_request(&mut receiver).await;
        assert!(matches!(request, Some(LedgerRequest::Set { .. })));
        drop(request);

        assert!(matches!(
            task.await.unwrap(),
            Err(StockError::ActorCommunication(_))
        ));
    }
}
