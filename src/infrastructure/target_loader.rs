//! Targets CSV loader
//!
//! Reads the monitored-products table into typed [`Target`] records.
//! Required columns are `sku`, `our_price`, `url` and `price_selector`;
//! `name` and `stock_selector` may be absent or empty. Malformed rows are
//! rejected here, at load time, rather than surfacing later as runtime
//! lookups against half-populated records.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::domain::model::Target;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open targets file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: missing required column '{column}'")]
    MissingField { row: usize, column: &'static str },

    #[error("row {row}: invalid reference price '{value}'")]
    InvalidPrice { row: usize, value: String },
}

/// Raw CSV row before validation; every column optional so we can report
/// exactly which required field is missing.
#[derive(Debug, Deserialize)]
struct TargetRow {
    sku: Option<String>,
    name: Option<String>,
    our_price: Option<String>,
    url: Option<String>,
    price_selector: Option<String>,
    stock_selector: Option<String>,
}

/// Load and validate all targets from a CSV file.
pub fn load_targets(path: &Path) -> Result<Vec<Target>, LoadError> {
    let path_text = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path_text.clone(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut targets = Vec::new();
    for (index, record) in reader.deserialize::<TargetRow>().enumerate() {
        // header is line 1, first data row is line 2
        let row = index + 2;
        let record = record.map_err(|source| LoadError::Csv {
            path: path_text.clone(),
            source,
        })?;
        targets.push(validate_row(record, row)?);
    }

    info!(count = targets.len(), path = %path_text, "loaded targets");
    Ok(targets)
}

fn validate_row(record: TargetRow, row: usize) -> Result<Target, LoadError> {
    let sku = required(record.sku, row, "sku")?;
    let url = required(record.url, row, "url")?;
    let price_selector = required(record.price_selector, row, "price_selector")?;
    let raw_price = required(record.our_price, row, "our_price")?;

    let our_price = raw_price
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .ok_or(LoadError::InvalidPrice {
            row,
            value: raw_price.clone(),
        })?;

    Ok(Target {
        sku,
        name: record.name.unwrap_or_default(),
        our_price,
        url,
        price_selector,
        stock_selector: record.stock_selector.filter(|s| !s.is_empty()),
    })
}

fn required(
    value: Option<String>,
    row: usize,
    column: &'static str,
) -> Result<String, LoadError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(LoadError::MissingField { row, column })
}
