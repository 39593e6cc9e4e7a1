//! Runtime orchestration and lifecycle management.
//!
//! This module contains the infrastructure for managing the stock core's runtime,
//! including:
//!
//! - **Startup**: Loading the ledger, spawning its actor, opening the audit store
//! - **Wiring**: Connecting the reconciler, the watcher and the workflow helpers
//! - **Observability setup**: Initializing tracing and logging
//!
//! # Main Components
//!
//! - [`StockSystem`] - The orchestrator that owns every component
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod stock_system;
pub mod tracing;

pub use self::stock_system::*;
pub use self::tracing::*;
