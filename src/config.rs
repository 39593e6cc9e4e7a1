//! # Configuration
//!
//! [`StockConfig`] is read from an optional TOML file and then overridden by
//! `STOCK_*` environment variables. Every field has a default, so an empty
//! file (or none at all) is a valid configuration.
//!
//! ```toml
//! ledger_path = "data/stock.json"
//! removal_policy = "delete"
//!
//! [watch]
//! interval_ms = 2000
//!
//! [api]
//! url = "https://supplier.example/stock"
//! ```
//!
//! An override that cannot be parsed is logged and ignored.

use crate::error::StockError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// What reconciliation does with products the external source no longer lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Keep them in the ledger; they are only reported as removed.
    #[default]
    Retain,
    /// Delete them from the ledger after the merge.
    Delete,
}

impl FromStr for RemovalPolicy {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(RemovalPolicy::Retain),
            "delete" => Ok(RemovalPolicy::Delete),
            other => Err(StockError::Config(format!("unknown removal policy {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockConfig {
    pub ledger_path: PathBuf,
    pub audit_path: PathBuf,
    pub spreadsheet_path: PathBuf,
    /// Mailbox size of the ledger actor.
    pub channel_capacity: usize,
    pub low_stock_threshold: u32,
    pub removal_policy: RemovalPolicy,
    pub watch: WatchConfig,
    pub api: ApiConfig,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("stock.json"),
            audit_path: PathBuf::from("stock_history.jsonl"),
            spreadsheet_path: PathBuf::from("stock_data.csv"),
            channel_capacity: 32,
            low_stock_threshold: 5,
            removal_policy: RemovalPolicy::Retain,
            watch: WatchConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    pub error_backoff_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 5_000,
            error_backoff_ms: 10_000,
        }
    }
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StockConfig {
    /// Loads `path` (if given) and applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, StockError> {
        let mut config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    StockError::Config(format!("failed to read {}: {e}", path.display()))
                })?;
                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, StockError> {
        toml::from_str(contents).map_err(|e| StockError::Config(format!("failed to parse config: {e}")))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut non_empty = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(raw) = non_empty("STOCK_LEDGER_PATH") {
            self.ledger_path = PathBuf::from(raw);
        }
        if let Some(raw) = non_empty("STOCK_AUDIT_PATH") {
            self.audit_path = PathBuf::from(raw);
        }
        if let Some(raw) = non_empty("STOCK_SPREADSHEET_PATH") {
            self.spreadsheet_path = PathBuf::from(raw);
        }

        if let Some(raw) = non_empty("STOCK_WATCH_ENABLED") {
            match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.watch.enabled = true,
                "0" | "false" | "no" | "off" => self.watch.enabled = false,
                _ => tracing::warn!("invalid STOCK_WATCH_ENABLED, ignoring: {raw}"),
            }
        }

        if let Some(raw) = non_empty("STOCK_WATCH_INTERVAL_MS") {
            match raw.parse::<u64>() {
                Ok(value) if value > 0 => self.watch.interval_ms = value,
                Ok(_) => tracing::warn!("STOCK_WATCH_INTERVAL_MS must be positive, ignoring"),
                Err(err) => tracing::warn!("invalid STOCK_WATCH_INTERVAL_MS, ignoring: {err}"),
            }
        }

        if let Some(raw) = non_empty("STOCK_API_URL") {
            self.api.url = Some(raw);
        }
        if let Some(raw) = non_empty("STOCK_API_TOKEN") {
            self.api.token = Some(raw);
        }

        if let Some(raw) = non_empty("STOCK_API_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(value) => self.api.timeout_secs = value,
                Err(err) => tracing::warn!("invalid STOCK_API_TIMEOUT_SECS, ignoring: {err}"),
            }
        }

        if let Some(raw) = non_empty("STOCK_REMOVAL_POLICY") {
            match raw.parse::<RemovalPolicy>() {
                Ok(policy) => self.removal_policy = policy,
                Err(err) => tracing::warn!("invalid STOCK_REMOVAL_POLICY, ignoring: {err}"),
            }
        }
    }
}
