//! Actor plumbing shared by the ledger and its clients.
//!
//! # Main Components
//!
//! - [`Response`] - One-shot responder carried by every request message
//! - [`ask`] - Request/response helper used by client handles
//! - [`FrameworkError`] - Channel-level error types
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test clients without spawning the actor.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use core::*;
