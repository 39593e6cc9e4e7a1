use crate::audit::{AuditLog, AuditOrder, JsonlAuditStore};
use crate::clients::{Ledger, LedgerClient};
use crate::config::StockConfig;
use crate::error::StockError;
use crate::ledger_actor::{self, LedgerStore};
use crate::model::{AuditEntry, StockSnapshot};
use crate::reconciler::{ApiSource, Reconcile, Reconciler, Reconciliation, SpreadsheetSource, StockSource};
use crate::watcher::{FileWatcher, ModifiedStamp, WatcherHandle};
use crate::workflow::{self, Fulfillment, StockCheck, StockOverview};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// The runtime orchestrator of the stock core.
///
/// `StockSystem` is responsible for:
/// - **Lifecycle Management**: Loading the ledger, spawning its actor, starting and
///   stopping the spreadsheet watcher, and flushing on shutdown
/// - **Dependency Wiring**: Handing the ledger client and the audit log to the
///   reconciler and the workflow helpers
/// - **Exposed Surface**: The operations an outer HTTP or CLI layer calls
///
/// # Example
///
/// ```ignore
/// let mut system = StockSystem::start(StockConfig::load(None)?)?;
///
/// system.set_stock_item("Widget", 10).await?;
/// let result = system.reconcile_from_file().await?;
/// let history = system.get_audit_history(20)?;
///
/// // Gracefully shut down when done
/// system.shutdown().await?;
/// ```
pub struct StockSystem {
    ledger: LedgerClient,
    audit: AuditLog,
    reconciler: Arc<Reconciler>,
    sheet: SpreadsheetSource,
    config: StockConfig,
    watcher: Option<WatcherHandle>,

    /// Task handles of the running actors (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl StockSystem {
    /// Loads persisted state and starts every component.
    ///
    /// Must be called from within a Tokio runtime. Fails if the ledger file
    /// exists but is unreadable or if the audit file cannot be opened.
    pub fn start(config: StockConfig) -> Result<Self, StockError> {
        let (ledger_actor, ledger) = ledger_actor::new(
            LedgerStore::new(&config.ledger_path),
            config.channel_capacity,
        )?;
        let ledger_handle = tokio::spawn(ledger_actor.run());

        let audit = AuditLog::new(Arc::new(JsonlAuditStore::open(&config.audit_path)?));
        let sheet = SpreadsheetSource::new(&config.spreadsheet_path, ModifiedStamp::new());
        let reconciler = Arc::new(Reconciler::new(
            Arc::new(ledger.clone()),
            audit.clone(),
            config.removal_policy,
            config.api.timeout(),
        ));

        let mut system = Self {
            ledger,
            audit,
            reconciler,
            sheet,
            config,
            watcher: None,
            handles: vec![ledger_handle],
        };
        if system.config.watch.enabled {
            system.start_watching();
        }

        info!(
            ledger = %system.config.ledger_path.display(),
            spreadsheet = %system.config.spreadsheet_path.display(),
            watching = system.is_watching(),
            "Stock system started"
        );
        Ok(system)
    }

    pub fn ledger(&self) -> &LedgerClient {
        &self.ledger
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn config(&self) -> &StockConfig {
        &self.config
    }

    pub fn spreadsheet(&self) -> &SpreadsheetSource {
        &self.sheet
    }

    pub async fn get_stock(&self) -> Result<StockSnapshot, StockError> {
        self.ledger.get_all().await
    }

    /// Operator overwrite of one product, audited as a manual update.
    pub async fn set_stock_item(&self, product: &str, quantity: u32) -> Result<u32, StockError> {
        workflow::set_item(&self.ledger, &self.audit, product, quantity).await
    }

    /// Removes units for an order, audited as order fulfillment.
    pub async fn deduct_stock(&self, product: &str, quantity: u32) -> Result<u32, StockError> {
        workflow::deduct_item(&self.ledger, &self.audit, product, quantity).await
    }

    pub async fn reconcile_from_file(&self) -> Result<Reconciliation, StockError> {
        self.reconciler
            .reconcile(&StockSource::Spreadsheet(self.sheet.clone()))
            .await
    }

    /// Reconciles from a remote feed. `url` and `key` fall back to the
    /// configured values.
    #[instrument(skip(self, key))]
    pub async fn reconcile_from_api(&self, url: Option<&str>, key: Option<&str>) -> Result<Reconciliation, StockError> {
        let url = url
            .map(str::to_string)
            .or_else(|| self.config.api.url.clone())
            .ok_or_else(|| StockError::Config("no stock API url configured".to_string()))?;
        let key = key
            .map(str::to_string)
            .or_else(|| self.config.api.token.clone());

        self.reconciler
            .reconcile(&StockSource::Api(ApiSource::new(url, key)))
            .await
    }

    /// The most recent audit entries, newest first.
    pub fn get_audit_history(&self, limit: usize) -> Result<Vec<AuditEntry>, StockError> {
        self.audit.query(limit, AuditOrder::NewestFirst)
    }

    pub async fn manual_update(&self, text: &str) -> Result<Vec<(String, u32)>, StockError> {
        workflow::manual_update(&self.ledger, &self.audit, text).await
    }

    pub async fn check_order(&self, text: &str) -> Result<StockCheck, StockError> {
        let stock = self.ledger.get_all().await?;
        Ok(workflow::check_order(text, &stock))
    }

    pub async fn fulfill_order(&self, text: &str) -> Result<Fulfillment, StockError> {
        workflow::fulfill_order(&self.ledger, &self.audit, Some(&self.sheet), text).await
    }

    pub async fn overview(&self) -> Result<StockOverview, StockError> {
        let stock = self.ledger.get_all().await?;
        Ok(workflow::overview(&stock, self.config.low_stock_threshold))
    }

    /// Starts the spreadsheet watcher. Returns `false` if it was already running.
    pub fn start_watching(&mut self) -> bool {
        if self.is_watching() {
            return false;
        }
        let watcher = FileWatcher::new(
            self.sheet.clone(),
            self.reconciler.clone(),
            self.config.watch.interval(),
            self.config.watch.error_backoff(),
        );
        self.watcher = Some(watcher.spawn());
        true
    }

    /// Stops the watcher, waiting for an in-flight reconciliation to finish.
    pub async fn stop_watching(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.stop().await;
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(WatcherHandle::is_running)
    }

    /// Gracefully shuts down the system.
    ///
    /// # Shutdown Process
    ///
    /// 1. Stop the watcher (it holds a ledger client through the reconciler)
    /// 2. Flush the ledger to disk
    /// 3. Drop every client, which closes the actor's channel
    /// 4. Wait for the actor task to exit
    ///
    /// A failed flush is returned after the actor has stopped.
    pub async fn shutdown(mut self) -> Result<(), StockError> {
        info!("Shutting down stock system...");
        self.stop_watching().await;

        let flushed = self.ledger.flush().await;
        if let Err(e) = &flushed {
            warn!(error = %e, "Final flush failed");
        }

        let Self {
            ledger,
            reconciler,
            handles,
            ..
        } = self;
        drop(reconciler);
        drop(ledger);

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(StockError::ActorCommunication(format!("Actor task failed: {e}")));
            }
        }

        info!("Stock system shutdown complete.");
        flushed
    }
}
