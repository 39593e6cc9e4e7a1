//! Remote stock feed over HTTP.
//!
//! Two payload shapes are accepted:
//!
//! ```text
//! {"stock": {"Widget": 10, "Gear": "4"}}
//! [{"product": "Widget", "quantity": 10}]          (also under an "items" key)
//! ```

use super::parse::quantity_from_json;
use crate::error::StockError;
use crate::model::StockSnapshot;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSource {
    url: String,
    bearer: Option<String>,
}

impl ApiSource {
    pub fn new(url: impl Into<String>, bearer: Option<String>) -> Self {
        Self {
            url: url.into(),
            bearer: bearer.filter(|token| !token.is_empty()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches and parses the feed.
    ///
    /// Transport errors, timeouts and non-2xx statuses are `SourceUnavailable`;
    /// a body that is not one of the accepted shapes is `MalformedSource`.
    pub async fn fetch(&self, client: &reqwest::Client, timeout: Duration) -> Result<StockSnapshot, StockError> {
        let mut req = client.get(&self.url).timeout(timeout);
        if let Some(token) = &self.bearer {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| StockError::SourceUnavailable(format!("{}: {e}", self.url)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StockError::SourceUnavailable(format!(
                "{} answered {status}",
                self.url
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| StockError::SourceUnavailable(format!("{}: {e}", self.url)))?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| StockError::MalformedSource(format!("{} returned invalid JSON: {e}", self.url)))?;

        let stock = parse_api_payload(&payload)?;
        debug!(url = %self.url, products = stock.len(), "Fetched stock feed");
        Ok(stock)
    }
}

/// Turns a decoded feed body into a candidate snapshot.
///
/// Entries whose quantity is not a non-negative integer are skipped. A list
/// entry missing its `product` or `quantity` key fails the whole payload.
pub fn parse_api_payload(payload: &Value) -> Result<StockSnapshot, StockError> {
    if let Some(stock) = payload.get("stock") {
        let map = stock
            .as_object()
            .ok_or_else(|| StockError::MalformedSource("\"stock\" must be an object".to_string()))?;
        let mut snapshot = StockSnapshot::new();
        for (product, value) in map {
            insert_entry(&mut snapshot, product, value);
        }
        return Ok(snapshot);
    }

    let items = match payload {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(StockError::MalformedSource(
                    "expected a \"stock\" object or an \"items\" list".to_string(),
                ))
            }
        },
        _ => {
            return Err(StockError::MalformedSource(
                "expected a JSON object or list".to_string(),
            ))
        }
    };

    let mut snapshot = StockSnapshot::new();
    for (index, item) in items.iter().enumerate() {
        let (Some(product), Some(value)) = (item.get("product"), item.get("quantity")) else {
            return Err(StockError::MalformedSource(format!(
                "item {index} lacks product or quantity"
            )));
        };
        match product.as_str() {
            Some(product) => insert_entry(&mut snapshot, product, value),
            None => warn!(index, "Skipping item with non-string product"),
        }
    }
    Ok(snapshot)
}

fn insert_entry(snapshot: &mut StockSnapshot, product: &str, value: &Value) {
    let product = product.trim();
    if product.is_empty() {
        warn!("Skipping feed entry without product name");
        return;
    }
    match quantity_from_json(value) {
        Some(quantity) => {
            snapshot.insert(product.to_string(), quantity);
        }
        None => warn!(product, quantity = %value, "Skipping feed entry with invalid quantity"),
    }
}
