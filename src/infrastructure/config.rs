//! Run configuration
//!
//! One explicit record built from the environment at process start and
//! passed down the pipeline; nothing reads environment variables after
//! startup.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `PRICE_DELTA_PCT` | undercut alert threshold in percent | `10` |
//! | `SLACK_WEBHOOK_URL` | Slack incoming webhook | disabled |
//! | `SMTP_HOST`/`SMTP_USER`/`SMTP_PASS`/`EMAIL_TO` | mail relay, all required together | disabled |
//! | `SMTP_PORT` | relay port | `587` |

use std::env;

use anyhow::{Context, Result};

/// SMTP relay settings; email alerting activates only when every field
/// could be resolved.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub to: String,
}

/// Run-wide configuration record.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Undercut alert threshold in percent; deltas strictly below
    /// `-threshold_pct` alert
    pub threshold_pct: f64,

    /// Slack incoming webhook, when chat notification is enabled
    pub slack_webhook_url: Option<String>,

    /// SMTP relay, when email notification is enabled
    pub email: Option<EmailConfig>,

    /// Politeness pause between targets, uniform in this range
    pub politeness_delay_ms: (u64, u64),
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            threshold_pct: 10.0,
            slack_webhook_url: None,
            email: None,
            politeness_delay_ms: (800, 1800),
        }
    }
}

impl MonitorConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let threshold_pct = match env::var("PRICE_DELTA_PCT") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("PRICE_DELTA_PCT is not a number: '{raw}'"))?,
            Err(_) => 10.0,
        };

        let slack_webhook_url = env::var("SLACK_WEBHOOK_URL").ok().filter(|v| !v.is_empty());

        Ok(Self {
            threshold_pct,
            slack_webhook_url,
            email: Self::email_from_env()?,
            ..Self::default()
        })
    }

    fn email_from_env() -> Result<Option<EmailConfig>> {
        let host = env::var("SMTP_HOST").ok().filter(|v| !v.is_empty());
        let user = env::var("SMTP_USER").ok().filter(|v| !v.is_empty());
        let password = env::var("SMTP_PASS").ok().filter(|v| !v.is_empty());
        let to = env::var("EMAIL_TO").ok().filter(|v| !v.is_empty());

        let (Some(host), Some(user), Some(password), Some(to)) = (host, user, password, to) else {
            return Ok(None);
        };

        let port = match env::var("SMTP_PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("SMTP_PORT is not a port number: '{raw}'"))?,
            Err(_) => 587,
        };

        Ok(Some(EmailConfig {
            host,
            port,
            user,
            password,
            to,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MonitorConfig::default();
        assert_eq!(config.threshold_pct, 10.0);
        assert_eq!(config.politeness_delay_ms, (800, 1800));
        assert!(config.slack_webhook_url.is_none());
        assert!(config.email.is_none());
    }
}
