//! pricewatch - competitor price monitoring and alerting
//!
//! Single-pass batch pipeline: read monitored targets from CSV, scrape each
//! competitor page with bounded retry, extract price and availability,
//! compare against our reference price, append the day's observations to an
//! append-only history CSV and push alerts to Slack/email best-effort.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{Monitor, RunReport};
pub use domain::{Alert, AlertReason, Observation, StockStatus, Target};
pub use infrastructure::{FetchError, Fetcher, MonitorConfig, PageSource, RetryPolicy};
