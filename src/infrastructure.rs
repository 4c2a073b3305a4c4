//! Infrastructure layer for HTTP fetching, HTML extraction, CSV persistence
//! and outbound notifications
//!
//! Everything that touches the filesystem, the network or the process
//! environment lives here, behind small seams the application layer
//! composes.

pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod history;
pub mod http_client;
pub mod logging;
pub mod notifier;
pub mod target_loader;

// Re-export commonly used items
pub use config::MonitorConfig;
pub use extractor::Extractor;
pub use fetcher::{FetchError, Fetcher, PageSource, RetryPolicy};
pub use history::HistorySink;
pub use http_client::{HttpClient, HttpClientConfig};
pub use notifier::Notifier;
pub use target_loader::load_targets;
