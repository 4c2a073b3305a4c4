//! Retrying page fetcher
//!
//! Wraps any [`PageSource`] in an explicit retry loop: bounded attempt
//! count, exponential backoff with a cap, and uniform jitter so repeated
//! runs do not hammer a target server in lockstep. Exhausting the attempts
//! surfaces the last [`FetchError`] to the caller; it is never swallowed at
//! this layer.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Terminal failure while retrieving a page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} on {url}")]
    Status { status: u16, url: String },

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },
}

/// Anything that can turn a URL into raw page text.
///
/// The production implementation is [`crate::infrastructure::HttpClient`];
/// tests substitute scripted sources.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Retry schedule: up to `max_attempts` total attempts, sleeping
/// `min(base_delay * 2^(n-1), max_delay)` plus jitter after the n-th
/// failure.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Zero-delay schedule for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Backoff to sleep after `failed_attempts` consecutive failures.
    fn backoff(&self, failed_attempts: u32) -> Duration {
        // 2^10 already exceeds any sane cap, avoid shift overflow beyond that
        let exponent = failed_attempts.saturating_sub(1).min(10);
        let backoff = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = Duration::from_millis(fastrand::u64(0..=jitter_ms));
        backoff + jitter
    }
}

/// A [`PageSource`] with retry semantics layered on top.
pub struct Fetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Fetch `url`, retrying transient failures per the policy.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.source.fetch(url).await {
                Ok(body) => {
                    debug!(url, attempt, "fetch succeeded");
                    return Ok(body);
                }
                Err(err) if attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "fetch failed, retrying: {err}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    warn!(url, attempt, "fetch failed terminally: {err}");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then returns `body`.
    struct FlakySource {
        failures: u32,
        calls: AtomicU32,
        body: &'static str,
    }

    impl FlakySource {
        fn new(failures: u32, body: &'static str) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                body,
            }
        }
    }

    #[async_trait]
    impl PageSource for FlakySource {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(FetchError::Status {
                    status: 503,
                    url: url.to_string(),
                })
            } else {
                Ok(self.body.to_string())
            }
        }
    }

    #[tokio::test]
    async fn succeeds_on_fourth_attempt() {
        let source = FlakySource::new(3, "<html></html>");
        let fetcher = Fetcher::new(source, RetryPolicy::immediate(4));
        let body = fetcher.fetch("https://example.com").await.unwrap();
        assert_eq!(body, "<html></html>");
        assert_eq!(fetcher.source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn four_failures_surface_the_terminal_error() {
        let source = FlakySource::new(4, "never");
        let fetcher = Fetcher::new(source, RetryPolicy::immediate(4));
        let err = fetcher.fetch("https://example.com").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                status: 503,
                url: "https://example.com".to_string()
            }
        );
        // no fifth attempt
        assert_eq!(fetcher.source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn immediate_success_needs_one_attempt() {
        let source = FlakySource::new(0, "ok");
        let fetcher = Fetcher::new(source, RetryPolicy::immediate(4));
        fetcher.fetch("https://example.com").await.unwrap();
        assert_eq!(fetcher.source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 8,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
            max_jitter: Duration::ZERO,
        };
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(5), Duration::from_secs(16));
        assert_eq!(policy.backoff(7), Duration::from_secs(16));
    }
}
