//! # External-Source Reconciler
//!
//! Turns an external representation of stock into a validated snapshot and
//! applies it to the ledger.
//!
//! ## Flow
//!
//! 1. Load the candidate snapshot from the [`StockSource`]. Bad rows are
//!    skipped; a missing or malformed source aborts before anything is touched.
//! 2. Diff the current ledger against the candidate.
//! 3. Merge the candidate into the ledger with one `bulk_set`.
//! 4. Under [`RemovalPolicy::Delete`], drop products the source no longer lists.
//! 5. Audit every added, removed, increased and decreased product.
//!
//! Under [`RemovalPolicy::Retain`] a product the source dropped stays in the
//! ledger. It is reported as removed on the first run that misses it and as
//! unchanged afterwards, until its ledger quantity changes or the source lists
//! it again. Reconciling twice from the same source is therefore a no-op.
//!
//! Two reconciliations running at once are not serialized against each other;
//! only their ledger calls are. Each may diff against a snapshot the other is
//! about to change.

pub mod api;
pub mod parse;
pub mod spreadsheet;

pub use api::{parse_api_payload, ApiSource};
pub use spreadsheet::SpreadsheetSource;

use crate::audit::AuditLog;
use crate::change_tracker::{diff, ChangeSet};
use crate::clients::Ledger;
use crate::config::RemovalPolicy;
use crate::error::StockError;
use crate::model::{AuditReason, StockSnapshot};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Where a reconciliation reads its candidate snapshot from.
#[derive(Debug, Clone)]
pub enum StockSource {
    Spreadsheet(SpreadsheetSource),
    Api(ApiSource),
}

impl StockSource {
    fn reasons(&self) -> SourceReasons {
        match self {
            StockSource::Spreadsheet(_) => SourceReasons {
                added: AuditReason::FileAdd,
                removed: AuditReason::FileRemove,
                changed: AuditReason::FileImport,
            },
            StockSource::Api(_) => SourceReasons {
                added: AuditReason::ApiImport,
                removed: AuditReason::ApiImport,
                changed: AuditReason::ApiImport,
            },
        }
    }
}

impl Display for StockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockSource::Spreadsheet(sheet) => write!(f, "spreadsheet {}", sheet.path().display()),
            StockSource::Api(api) => write!(f, "api {}", api.url()),
        }
    }
}

struct SourceReasons {
    added: AuditReason,
    removed: AuditReason,
    changed: AuditReason,
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub changes: ChangeSet,
    /// Number of audit entries written.
    pub change_count: usize,
}

/// Anything that can reconcile the ledger with a source.
#[async_trait]
pub trait Reconcile: Send + Sync {
    async fn reconcile(&self, source: &StockSource) -> Result<Reconciliation, StockError>;
}

pub struct Reconciler {
    ledger: Arc<dyn Ledger>,
    audit: AuditLog,
    removal_policy: RemovalPolicy,
    http: reqwest::Client,
    api_timeout: Duration,
    /// Per source, the retained removals already reported, with the ledger
    /// quantity at that time.
    reported_removals: Mutex<BTreeMap<String, StockSnapshot>>,
}

impl Reconciler {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        audit: AuditLog,
        removal_policy: RemovalPolicy,
        api_timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            audit,
            removal_policy,
            http: reqwest::Client::new(),
            api_timeout,
            reported_removals: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn removal_policy(&self) -> RemovalPolicy {
        self.removal_policy
    }

    /// Moves retained removals that were already reported, at the same
    /// quantity, from `removed` to `unchanged`.
    fn skip_reported_removals(&self, source: &StockSource, changes: &mut ChangeSet) {
        if self.removal_policy != RemovalPolicy::Retain {
            return;
        }
        let guard = self
            .reported_removals
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(reported) = guard.get(&source.to_string()) else {
            return;
        };
        let settled: Vec<String> = changes
            .removed
            .iter()
            .filter(|&(product, quantity)| reported.get(product) == Some(quantity))
            .map(|(product, _)| product.clone())
            .collect();
        for product in settled {
            if let Some(quantity) = changes.removed.remove(&product) {
                changes.unchanged.insert(product, quantity);
            }
        }
    }

    /// Records every product `source` currently omits from the ledger.
    fn remember_removals(&self, source: &StockSource, dropped: StockSnapshot) {
        if self.removal_policy != RemovalPolicy::Retain {
            return;
        }
        self.reported_removals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source.to_string(), dropped);
    }

    async fn load(&self, source: &StockSource) -> Result<StockSnapshot, StockError> {
        match source {
            StockSource::Spreadsheet(sheet) => {
                let sheet = sheet.clone();
                tokio::task::spawn_blocking(move || sheet.read_stock())
                    .await
                    .map_err(|e| StockError::SourceUnavailable(format!("spreadsheet read task failed: {e}")))?
            }
            StockSource::Api(api) => api.fetch(&self.http, self.api_timeout).await,
        }
    }

    /// Applies `candidate` and writes the audit trail for `changes`.
    async fn apply(
        &self,
        source: &StockSource,
        candidate: StockSnapshot,
        changes: &ChangeSet,
    ) -> Result<usize, StockError> {
        if !changes.is_empty() {
            self.ledger.bulk_set(candidate).await?;
        }

        let deleted = self.removal_policy == RemovalPolicy::Delete;
        if deleted && !changes.removed.is_empty() {
            let removed = changes.removed.keys().cloned().collect();
            self.ledger.remove_many(removed).await?;
        }

        let reasons = source.reasons();
        for (product, &quantity) in &changes.added {
            self.audit.record(product, 0, quantity, reasons.added);
        }
        for (product, change) in changes.increased.iter().chain(&changes.decreased) {
            self.audit
                .record(product, change.old, change.new, reasons.changed);
        }
        for (product, &quantity) in &changes.removed {
            let resulting = if deleted { 0 } else { quantity };
            self.audit.record(product, quantity, resulting, reasons.removed);
        }

        Ok(changes.change_count())
    }
}

#[async_trait]
impl Reconcile for Reconciler {
    #[instrument(skip(self, source), fields(source = %source))]
    async fn reconcile(&self, source: &StockSource) -> Result<Reconciliation, StockError> {
        let candidate = self.load(source).await?;
        let current = self.ledger.get_all().await?;
        let mut changes = diff(&current, &candidate);
        let dropped = changes.removed.clone();
        self.skip_reported_removals(source, &mut changes);
        debug!(%changes, "Computed change set");

        let change_count = self.apply(source, candidate, &changes).await?;
        self.remember_removals(source, dropped);
        if change_count > 0 {
            info!(change_count, %changes, "Reconciled");
        } else {
            debug!("Reconciled, no changes");
        }

        Ok(Reconciliation {
            changes,
            change_count,
        })
    }
}
