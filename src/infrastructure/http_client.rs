//! HTTP client for competitor page scraping
//!
//! Thin wrapper over `reqwest` tuned for scraping rather than API calls:
//! per-request User-Agent rotation from a small fixed pool plus a
//! `Cache-Control: no-cache` hint, both best-effort measures against
//! server-side caching and blocking, not correctness requirements.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT};
use reqwest::Client;
use tracing::debug;

use crate::infrastructure::fetcher::{FetchError, PageSource};

/// Common browser identities, rotated per request to reduce blocking.
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0 Safari/537.36",
];

/// HTTP client configuration for scraping
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout_seconds: u64,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 20,
            follow_redirects: true,
        }
    }
}

/// Scraping-oriented HTTP client.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .gzip(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Fetch a URL and return its body as text.
    ///
    /// Any status >= 400 or transport failure maps to a [`FetchError`];
    /// the retry loop above decides what to do with it.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let ua = USER_AGENTS[fastrand::usize(..USER_AGENTS.len())];

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, ua)
            .header(ACCEPT_LANGUAGE, "es-ES,es;q=0.9,en;q=0.8")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        debug!(url, chars = text.len(), "fetched page body");
        Ok(text)
    }
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.get_text(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_default_config() {
        let client = HttpClient::new(HttpClientConfig::default());
        assert!(client.is_ok());
    }
}
