//! Best-effort alert notification
//!
//! The [`Notifier`] contract has no error return on purpose: a broken
//! webhook or mail relay must never fail the run or change its exit status.
//! Implementations log delivery problems at `warn` and move on.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::model::Alert;
use crate::infrastructure::config::EmailConfig;

/// At most this many alerts are enumerated in a notification body.
const MAX_LISTED_ALERTS: usize = 10;

/// Fire-and-forget sink for the day's alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alerts: &[Alert], date: NaiveDate);
}

fn alert_line(alert: &Alert) -> String {
    format!(
        "- {} {}: {} (competitor: {}, ours: {})",
        alert.sku,
        alert.name,
        alert.reason.label(),
        alert
            .competitor_price
            .map_or_else(|| "n/a".to_string(), |p| format!("{p}")),
        alert.our_price,
    )
}

/// Slack incoming-webhook notifier.
pub struct SlackNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create Slack HTTP client")?;
        Ok(Self {
            webhook_url,
            client,
        })
    }

    fn payload_text(alerts: &[Alert], date: NaiveDate) -> String {
        let mut lines = vec![format!(
            ":rotating_light: *{} pricing alerts* – {date}",
            alerts.len()
        )];
        lines.extend(alerts.iter().take(MAX_LISTED_ALERTS).map(alert_line));
        lines.join("\n")
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, alerts: &[Alert], date: NaiveDate) {
        if alerts.is_empty() {
            return;
        }

        let text = Self::payload_text(alerts, date);
        let result = self
            .client
            .post(&self.webhook_url)
            .json(&json!({ "text": text }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(alerts = alerts.len(), "Slack notification sent");
            }
            Ok(response) => {
                warn!(status = %response.status(), "Slack webhook rejected notification");
            }
            Err(err) => {
                warn!("Slack notification failed: {err}");
            }
        }
    }
}

/// SMTP email notifier; active only when the relay is fully configured.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn body(alerts: &[Alert], date: NaiveDate) -> String {
        let mut body = format!("{} pricing alerts detected ({date}).\n\n", alerts.len());
        for alert in alerts {
            body.push_str(&alert_line(alert));
            body.push('\n');
        }
        body
    }

    async fn send(&self, alerts: &[Alert], date: NaiveDate) -> Result<()> {
        let from: Mailbox = self
            .config
            .user
            .parse()
            .context("SMTP_USER is not a valid mailbox address")?;
        let to: Mailbox = self
            .config
            .to
            .parse()
            .context("EMAIL_TO is not a valid mailbox address")?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(format!("[Price Monitor] {} alerts – {date}", alerts.len()))
            .body(Self::body(alerts, date))
            .context("failed to build alert email")?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .context("failed to configure SMTP relay")?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.user.clone(),
                self.config.password.clone(),
            ))
            .build();

        mailer.send(message).await.context("SMTP send failed")?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, alerts: &[Alert], date: NaiveDate) {
        if alerts.is_empty() {
            return;
        }

        match self.send(alerts, date).await {
            Ok(()) => info!(alerts = alerts.len(), "alert email sent"),
            Err(err) => warn!("email notification failed: {err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AlertReason;

    fn alert(sku: &str) -> Alert {
        Alert {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            sku: sku.into(),
            name: "Widget".into(),
            our_price: 50.0,
            competitor_price: Some(40.0),
            delta_pct: Some(-20.0),
            reason: AlertReason::PriceUndercut,
        }
    }

    #[test]
    fn slack_payload_lists_at_most_ten_alerts() {
        let alerts: Vec<Alert> = (0..15).map(|i| alert(&format!("SKU{i}"))).collect();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let text = SlackNotifier::payload_text(&alerts, date);
        assert!(text.starts_with(":rotating_light: *15 pricing alerts*"));
        assert_eq!(text.lines().count(), 1 + 10);
    }

    #[test]
    fn email_body_mentions_every_alert() {
        let alerts = vec![alert("SKU1"), alert("SKU2")];
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let body = EmailNotifier::body(&alerts, date);
        assert!(body.contains("SKU1"));
        assert!(body.contains("SKU2"));
        assert!(body.contains("competitor undercuts our price"));
    }

    #[tokio::test]
    async fn unreachable_webhook_is_swallowed() {
        let notifier = SlackNotifier::new("http://127.0.0.1:1/hook".into()).unwrap();
        // must not panic or propagate
        notifier
            .notify(&[alert("SKU1")], NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
            .await;
    }
}
