//! The watched stock spreadsheet (CSV).
//!
//! Reading locates the `Product` and `Quantity` columns by header name and
//! ignores everything else. Writing produces the full layout operators edit:
//! `Product,Quantity,Unit,Supplier,Last_Updated`.

use super::parse::parse_quantity;
use crate::error::StockError;
use crate::ledger_actor::store::atomic_write;
use crate::model::StockSnapshot;
use crate::watcher::ModifiedStamp;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PRODUCT_COLUMN: &str = "product";
const QUANTITY_COLUMN: &str = "quantity";
const HEADER: [&str; 5] = ["Product", "Quantity", "Unit", "Supplier", "Last_Updated"];

#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    path: PathBuf,
    stamp: ModifiedStamp,
}

impl SpreadsheetSource {
    /// `stamp` is shared with the watcher of the same file.
    pub fn new(path: impl Into<PathBuf>, stamp: ModifiedStamp) -> Self {
        Self {
            path: path.into(),
            stamp,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stamp(&self) -> &ModifiedStamp {
        &self.stamp
    }

    /// Parses the file into a candidate snapshot.
    ///
    /// Fails with `SourceUnavailable` if the file cannot be opened and with
    /// `MalformedSource` if either required column is missing. Rows with a
    /// blank product or an unusable quantity are skipped.
    pub fn read_stock(&self) -> Result<StockSnapshot, StockError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| {
                StockError::SourceUnavailable(format!("{}: {e}", self.path.display()))
            })?;

        let headers = reader
            .headers()
            .map_err(|e| StockError::MalformedSource(format!("{}: {e}", self.path.display())))?
            .clone();
        let column = |name: &str| {
            headers.iter().position(|header| {
                header.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name)
            })
        };
        let (product_idx, quantity_idx) = match (column(PRODUCT_COLUMN), column(QUANTITY_COLUMN)) {
            (Some(p), Some(q)) => (p, q),
            _ => {
                return Err(StockError::MalformedSource(format!(
                    "{} must have Product and Quantity columns",
                    self.path.display()
                )))
            }
        };

        let mut stock = StockSnapshot::new();
        let mut skipped = 0usize;
        for (index, record) in reader.records().enumerate() {
            // Header is line 1.
            let line = index + 2;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(line, error = %e, "Skipping unreadable row");
                    skipped += 1;
                    continue;
                }
            };

            let product = record.get(product_idx).unwrap_or("").trim();
            let raw_quantity = record.get(quantity_idx).unwrap_or("");
            if product.is_empty() {
                if !raw_quantity.is_empty() {
                    warn!(line, "Skipping row without product name");
                    skipped += 1;
                }
                continue;
            }
            match parse_quantity(raw_quantity) {
                Some(quantity) => {
                    stock.insert(product.to_string(), quantity);
                }
                None => {
                    warn!(line, product, quantity = raw_quantity, "Skipping row with invalid quantity");
                    skipped += 1;
                }
            }
        }

        debug!(path = %self.path.display(), products = stock.len(), skipped, "Read spreadsheet");
        Ok(stock)
    }

    /// Rewrites the file from `stock` and records the new modification time.
    pub fn write_stock(&self, stock: &StockSnapshot) -> Result<(), StockError> {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(HEADER).map_err(render_error)?;
        for (product, quantity) in stock {
            let quantity = quantity.to_string();
            writer
                .write_record([product.as_str(), quantity.as_str(), "units", "", today.as_str()])
                .map_err(render_error)?;
        }
        let data = writer.into_inner().map_err(render_error)?;

        self.stamp
            .record_write(&self.path, || atomic_write(&self.path, &data))?;
        info!(path = %self.path.display(), products = stock.len(), "Wrote spreadsheet");
        Ok(())
    }
}

fn render_error(e: impl std::fmt::Display) -> StockError {
    StockError::PersistenceFailure(format!("failed to render spreadsheet: {e}"))
}
