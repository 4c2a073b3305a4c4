//! Monitoring pipeline
//!
//! One run processes every target sequentially: fetch with retry, extract,
//! compute deltas, evaluate the alert rules. A failing target is recorded
//! as an observation with its error message and never aborts the run.
//! After the loop the history is appended first, then the alert table and
//! summary are written, then notifications go out best-effort.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::domain::alerting;
use crate::domain::model::{Alert, Observation, Target};
use crate::infrastructure::config::MonitorConfig;
use crate::infrastructure::extractor::Extractor;
use crate::infrastructure::fetcher::{FetchError, Fetcher, PageSource, RetryPolicy};
use crate::infrastructure::history::HistorySink;
use crate::infrastructure::notifier::Notifier;

/// What one run produced and where it was written.
#[derive(Debug)]
pub struct RunReport {
    pub date: NaiveDate,
    pub observations: usize,
    pub alerts: usize,
    pub history_path: PathBuf,
    pub alerts_path: Option<PathBuf>,
    pub summary_path: PathBuf,
}

/// The monitoring pipeline, generic over the page source so tests can run
/// it against scripted pages.
pub struct Monitor<S> {
    fetcher: Fetcher<S>,
    extractor: Extractor,
    config: MonitorConfig,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl<S: PageSource> Monitor<S> {
    pub fn new(source: S, policy: RetryPolicy, config: MonitorConfig) -> Self {
        Self {
            fetcher: Fetcher::new(source, policy),
            extractor: Extractor::new(),
            config,
            notifiers: Vec::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Run the pipeline once over `targets`, writing outputs to `outdir`.
    ///
    /// Succeeds whether or not alerts fired, and even when every single
    /// target failed; only output I/O problems abort the run.
    pub async fn run(&self, targets: &[Target], outdir: &Path) -> Result<RunReport> {
        let date = Utc::now().date_naive();
        let sink = HistorySink::new(outdir);
        sink.ensure_outdir()?;

        let mut observations: Vec<Observation> = Vec::with_capacity(targets.len());
        let mut alerts: Vec<Alert> = Vec::new();

        for target in targets {
            match self.process_target(target, date).await {
                Ok((observation, mut target_alerts)) => {
                    observations.push(observation);
                    alerts.append(&mut target_alerts);
                }
                Err(err) => {
                    warn!(sku = %target.sku, url = %target.url, "target failed: {err}");
                    observations.push(Observation::failed(target, date, &err.to_string()));
                }
            }
            self.politeness_pause().await;
        }

        // history must land before the summary is derived
        let history_path = sink.append_history(&observations)?;
        let alerts_path = sink.write_alerts(&alerts, date)?;
        let summary_path = sink.write_summary(date, targets.len(), &alerts)?;

        if !alerts.is_empty() {
            for notifier in &self.notifiers {
                notifier.notify(&alerts, date).await;
            }
        }

        info!(
            observations = observations.len(),
            alerts = alerts.len(),
            "monitor run finished"
        );

        Ok(RunReport {
            date,
            observations: observations.len(),
            alerts: alerts.len(),
            history_path,
            alerts_path,
            summary_path,
        })
    }

    async fn process_target(
        &self,
        target: &Target,
        date: NaiveDate,
    ) -> Result<(Observation, Vec<Alert>), FetchError> {
        let html = self.fetcher.fetch(&target.url).await?;
        let extraction =
            self.extractor
                .extract(&html, &target.price_selector, target.stock_selector.as_deref());

        let observation = Observation::from_reading(target, date, extraction.price, extraction.stock);
        let alerts = alerting::evaluate(
            target,
            date,
            extraction.price,
            observation.diff_pct,
            extraction.stock,
            self.config.threshold_pct,
        );

        Ok((observation, alerts))
    }

    /// Randomized pause between targets to keep the request rate polite.
    async fn politeness_pause(&self) {
        let (lo, hi) = self.config.politeness_delay_ms;
        if hi == 0 {
            return;
        }
        let millis = fastrand::u64(lo..=hi.max(lo));
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}
