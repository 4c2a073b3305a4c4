//! Core record types for the price monitoring pipeline
//!
//! A [`Target`] is one monitored competitor product, loaded from the targets
//! CSV at run start. Each run produces exactly one [`Observation`] per target
//! and zero or more derived [`Alert`]s.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single monitored product with its reference price and scraping rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Unique product identifier within one run
    pub sku: String,
    /// Human-readable display name (may be empty)
    pub name: String,
    /// Our reference price, non-negative
    pub our_price: f64,
    /// Competitor page to scrape
    pub url: String,
    /// CSS selector locating the price element
    pub price_selector: String,
    /// Optional CSS selector locating an availability indicator
    pub stock_selector: Option<String>,
}

/// Availability classification extracted from a competitor page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    /// No stock selector configured, or the selector matched nothing
    Unknown,
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InStock => write!(f, "in_stock"),
            Self::OutOfStock => write!(f, "out_of_stock"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One day's measurement for one target.
///
/// Appended verbatim to the cumulative history CSV; `None` fields serialize
/// as empty cells so that "no data" never reads as zero. Rows are immutable
/// once created and duplicates across reruns on the same day are expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub sku: String,
    pub name: String,
    pub our_price: f64,
    pub competitor_price: Option<f64>,
    pub diff_abs: Option<f64>,
    pub diff_pct: Option<f64>,
    pub stock: StockStatus,
    pub url: String,
    pub error: Option<String>,
}

impl Observation {
    /// Build an observation from a successful fetch/extract cycle.
    ///
    /// Deltas are computed only when a competitor price was actually
    /// obtained; an absent price leaves them undefined.
    pub fn from_reading(
        target: &Target,
        date: NaiveDate,
        competitor_price: Option<f64>,
        stock: StockStatus,
    ) -> Self {
        let diff_abs = competitor_price.map(|p| p - target.our_price);
        let diff_pct = diff_abs.map(|d| d / target.our_price * 100.0);
        Self {
            date,
            sku: target.sku.clone(),
            name: target.name.clone(),
            our_price: target.our_price,
            competitor_price,
            diff_abs,
            diff_pct,
            stock,
            url: target.url.clone(),
            error: None,
        }
    }

    /// Build an observation recording a per-target failure.
    ///
    /// Price and delta fields stay undefined; the error message is truncated
    /// so one noisy failure cannot bloat the history file.
    pub fn failed(target: &Target, date: NaiveDate, error: &str) -> Self {
        // char-wise so a multibyte boundary at the cutoff cannot panic
        let message: String = error.chars().take(200).collect();
        Self {
            date,
            sku: target.sku.clone(),
            name: target.name.clone(),
            our_price: target.our_price,
            competitor_price: None,
            diff_abs: None,
            diff_pct: None,
            stock: StockStatus::Unknown,
            url: target.url.clone(),
            error: Some(message),
        }
    }
}

/// Why an alert fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    /// Competitor price beats ours by more than the configured percentage
    PriceUndercut,
    /// Competitor is out of stock while we presumably still sell
    StockGap,
}

impl AlertReason {
    /// Human-readable label used in summaries and notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PriceUndercut => "competitor undercuts our price",
            Self::StockGap => "competitor out of stock",
        }
    }
}

/// A single alert derived from one observation.
///
/// Alerts exist only in the day's alert table and notification payloads;
/// they are never persisted independently of the run that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub date: NaiveDate,
    pub sku: String,
    pub name: String,
    pub our_price: f64,
    pub competitor_price: Option<f64>,
    pub delta_pct: Option<f64>,
    pub reason: AlertReason,
}
