#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Stock Recipe
//!
//! > **The stock-tracking core of an order-processing system.**
//!
//! This crate keeps an authoritative `product -> quantity` ledger, reconciles it
//! with an operator-edited spreadsheet or a remote feed, watches the spreadsheet
//! for edits, and records every quantity change in an append-only audit log.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Why an Actor for the Ledger?
//!
//! Many callers touch stock at once: request handlers, the watcher, order
//! fulfillment. The ledger must never lose an update or sell the same last unit
//! twice. Instead of guarding a map with a lock, one Tokio task owns it and
//! processes requests one at a time:
//! - **Linearizable**: Every read sees the state before or after a mutation, never between.
//! - **Batchable**: A bulk merge or a whole order is one message, so nothing interleaves with it.
//! - **Testable**: Callers only see the [`Ledger`](clients::Ledger) trait and a channel.
//!
//! ## 🚀 Core Concepts
//!
//! ### Reconciliation
//! An external snapshot is diffed against the ledger by the pure
//! [`change_tracker::diff`], merged in, and audited per product. Sources that
//! are missing or malformed abort before anything changes; bad rows are skipped.
//!
//! ### Mocking: Testing without Pain
//! Code that *uses* the ledger can be tested against a mock channel.
//! See the [`framework::mock`] module for the helpers.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! A single [`StockError`](error::StockError) covers caller mistakes
//! (`InvalidQuantity`, `InsufficientStock`, `MalformedSource`) and system
//! failures (`SourceUnavailable`, `PersistenceFailure`). Channel failures from
//! the actor plumbing convert into it with `From`.
//!
//! ### 2. Best-Effort Durability
//! The ledger persists after every mutation with an atomic file replace. A failed
//! write is logged; the in-memory state stays authoritative. Audit appends never
//! block the mutation that caused them.
//!
//! ### 3. Cancellable Watcher
//! The spreadsheet watcher is a Tokio task stopped through a `Notify`. It never
//! runs two reconciliations at once and never reprocesses the system's own writes.
//!
//! ### 4. Observability
//! We use `tracing` everywhere with structured fields.
//! See the [`lifecycle::tracing`] module for details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`ledger_actor`], [`framework`])
//! - **Role**: Sole owner of current stock truth and its backing file.
//! - **Key items**: [`LedgerActor`](ledger_actor::LedgerActor), [`ask`](framework::ask).
//!
//! ### 2. The Interface ([`clients`])
//! - **Role**: The [`Ledger`](clients::Ledger) capability and its channel-backed
//!   [`LedgerClient`](clients::LedgerClient).
//!
//! ### 3. Synchronization ([`change_tracker`], [`reconciler`], [`watcher`])
//! - **Role**: Bring external stock data into the ledger.
//! - **Key items**: [`Reconciler`](reconciler::Reconciler), [`FileWatcher`](watcher::FileWatcher).
//!
//! ### 4. History ([`audit`])
//! - **Role**: Durable, queryable record of every change.
//!
//! ### 5. The Orchestrator ([`lifecycle`], [`workflow`], [`config`])
//! - **Role**: Wire everything from a [`StockConfig`](config::StockConfig) and expose the
//!   operations an outer layer calls.
//! - **Key items**: [`StockSystem`](lifecycle::StockSystem).
//!
//! ## 🚀 Quick Start
//!
//! ### Running the Demo
//!
//! ```bash
//! # Watch ./stock_data.csv with info logs
//! RUST_LOG=info cargo run
//!
//! # Use a config file
//! cargo run -- stock.toml
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod audit;
pub mod change_tracker;
pub mod clients;
pub mod config;
pub mod error;
pub mod framework;
pub mod ledger_actor;
pub mod lifecycle;
pub mod model;
pub mod reconciler;
pub mod watcher;
pub mod workflow;
