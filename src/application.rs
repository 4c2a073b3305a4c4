//! Application layer module
//!
//! Orchestrates one monitoring run: load targets, fetch and extract each
//! one sequentially, evaluate the alert rules and hand the results to the
//! sinks and notifiers.

pub mod monitor;

pub use monitor::{Monitor, RunReport};
