//! Domain module - core records and alerting rules
//!
//! Holds the typed records flowing through the pipeline (targets,
//! observations, alerts) and the pure alert-rule evaluation. Nothing in
//! here performs I/O.

pub mod alerting;
pub mod model;

// Re-export commonly used items for convenience
pub use model::{Alert, AlertReason, Observation, StockStatus, Target};
