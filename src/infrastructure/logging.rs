//! Logging setup
//!
//! Console `tracing` subscriber with `RUST_LOG`-style filtering, defaulting
//! to `info`.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. Call once at startup.
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))
}
