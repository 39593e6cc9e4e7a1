//! # Stock Recipe Demo
//!
//! Starts the [`StockSystem`] from configuration, reconciles the spreadsheet
//! once, prints an overview, then keeps watching the spreadsheet until Ctrl-C.
//!
//! ```bash
//! RUST_LOG=info cargo run -- [config.toml]
//! ```

use stock_recipe::config::StockConfig;
use stock_recipe::error::StockError;
use stock_recipe::lifecycle::{setup_tracing, StockSystem};
use std::path::PathBuf;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), StockError> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = StockConfig::load(config_path.as_deref())?;
    info!(?config, "Starting stock system");

    let system = StockSystem::start(config)?;

    let span = tracing::info_span!("initial_sync");
    async {
        match system.reconcile_from_file().await {
            Ok(result) => {
                for line in result.changes.summary() {
                    info!("{line}");
                }
            }
            Err(e) => warn!(error = %e, "Initial spreadsheet sync skipped"),
        }
    }
    .instrument(span)
    .await;

    let overview = system.overview().await?;
    for insight in &overview.insights {
        info!("{insight}");
    }

    info!("Watching for changes, press Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
    }

    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}
