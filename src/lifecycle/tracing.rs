//! # Observability & Tracing
//!
//! This module provides the tracing infrastructure for the stock core.
//!
//! ## Overview
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate,
//! providing spans that show which client call or reconciliation a log line belongs to.
//!
//! ## Configuration
//!
//! The framework uses a compact format that hides the crate/module prefix (`with_target(false)`).
//! This keeps log lines short while still providing rich structured data.
//!
//! - **Structured logging** with `tracing` crate
//! - **Hierarchical spans** for request tracing
//! - **Configurable log levels** via `RUST_LOG` environment variable
//! - **Compact format** optimized for development
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle**: Ledger startup, shutdown, and final size
//! - **Ledger Operations**: Set, Deduct, BulkSet and friends, with product and quantity
//! - **Reconciliation**: Source, change count and the `+added -removed ^up vdown =same` summary
//! - **Watcher**: Seeding, detected edits, sync results and failures
//! - **Errors**: Rejected deductions, skipped rows, failed persists and audit appends
//!
//! ## Usage Examples
//!
//! ```bash
//! # Compact logs (default)
//! RUST_LOG=info cargo run
//!
//! # Show full payloads with debug logs
//! RUST_LOG=debug cargo run
//!
//! # Filter to specific modules
//! RUST_LOG=stock_recipe::watcher=debug cargo run
//! ```
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=info`**, an edited spreadsheet followed by an order:
//!
//! ```text
//! INFO Ledger actor started path=stock.json size=2
//! INFO Spreadsheet changed, reconciling path=stock_data.csv
//! INFO BulkSet size=3
//! INFO reconcile: Reconciled change_count=3 changes=+1 -1 ^1 v0 =0 source=spreadsheet stock_data.csv
//! INFO Sync complete change_count=3
//! INFO Deducted batch lines=2
//! INFO fulfill_order: Order fulfilled lines=2 units=6 text="Widget: 4, Gear: 2"
//! INFO Wrote spreadsheet path=stock_data.csv products=3
//! ```
//!
//! Each step carries structured fields that can be filtered and analyzed in
//! production logging systems.

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// Falls back to `info` when `RUST_LOG` is unset or invalid. Calling it a
/// second time (tests, embedding) leaves the first subscriber in place.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // Don't show module paths; the fields say enough
        .compact() // Compact format shows spans inline (e.g., "reconcile:")
        .try_init();
}
