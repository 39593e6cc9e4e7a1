//! # Core Actor Plumbing
//!
//! The request/response building blocks shared by every actor in the crate.
//!
//! ## Key Types
//!
//! - [`Response`]: The one-shot channel an actor answers on.
//! - [`FrameworkError`]: Channel-level failures (the actor is gone, or it dropped the responder).
//! - [`ask`]: Sends a request built around a fresh responder and awaits the answer.

use tokio::sync::{mpsc, oneshot};

/// Errors that can occur within the actor plumbing itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
}

/// Type alias for the one-shot response channel used by actors.
///
/// The error parameter defaults to [`FrameworkError`]; actors with a domain
/// error type (the ledger answers with `StockError`) name their own.
pub type Response<T, E = FrameworkError> = oneshot::Sender<Result<T, E>>;

/// Sends one request to an actor and waits for its answer.
///
/// # Architecture Note
/// Every client method has the same shape: create a oneshot pair, wrap the
/// sender into a request message, push it onto the actor's mailbox and await
/// the receiver. `build` receives the responder and returns the message.
///
/// The outer `Result` reports plumbing failures; the inner one is whatever the
/// actor answered.
pub async fn ask<M, T, E>(
    sender: &mpsc::Sender<M>,
    build: impl FnOnce(Response<T, E>) -> M,
) -> Result<Result<T, E>, FrameworkError> {
    let (respond_to, response) = oneshot::channel();
    sender
        .send(build(respond_to))
        .await
        .map_err(|_| FrameworkError::ActorClosed)?;
    response.await.map_err(|_| FrameworkError::ActorDropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum EchoRequest {
        Double {
            value: u32,
            respond_to: Response<u32>,
        },
    }

    #[tokio::test]
    async fn test_ask_round_trip() {
        let (sender, mut receiver) = mpsc::channel::<EchoRequest>(4);
        tokio::spawn(async move {
            while let Some(EchoRequest::Double { value, respond_to }) = receiver.recv().await {
                let _ = respond_to.send(Ok(value * 2));
            }
        });

        let answer = ask(&sender, |respond_to| EchoRequest::Double {
            value: 21,
            respond_to,
        })
        .await
        .unwrap();
        assert_eq!(answer, Ok(42));
    }

    #[tokio::test]
    async fn test_ask_closed_actor() {
        let (sender, receiver) = mpsc::channel::<EchoRequest>(4);
        drop(receiver);

        let result = ask(&sender, |respond_to| EchoRequest::Double {
            value: 1,
            respond_to,
        })
        .await;
        assert_eq!(result, Err(FrameworkError::ActorClosed));
    }

    #[tokio::test]
    async fn test_ask_dropped_responder() {
        let (sender, mut receiver) = mpsc::channel::<EchoRequest>(4);
        tokio::spawn(async move {
            // Swallow the request without answering.
            let _ = receiver.recv().await;
        });

        let result = ask(&sender, |respond_to| EchoRequest::Double {
            value: 1,
            respond_to,
        })
        .await;
        assert_eq!(result, Err(FrameworkError::ActorDropped));
    }
}
