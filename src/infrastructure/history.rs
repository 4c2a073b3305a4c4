//! History, alert table and summary outputs
//!
//! Writes the run's files into one output directory: the cumulative
//! append-only `price_history.csv`, the day's `alerts_YYYYMMDD.csv` (only
//! when at least one alert fired) and a `summary_YYYYMMDD.md` recap.
//! Reruns on the same day append duplicate rows; nothing is rewritten or
//! deduplicated. The history append always completes before the summary
//! is written.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::domain::model::{Alert, Observation};

/// Writer for the per-run output files.
pub struct HistorySink {
    outdir: PathBuf,
}

impl HistorySink {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
        }
    }

    /// Create the output directory if it does not exist yet.
    pub fn ensure_outdir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.outdir)
            .with_context(|| format!("failed to create output directory {}", self.outdir.display()))
    }

    pub fn history_path(&self) -> PathBuf {
        self.outdir.join("price_history.csv")
    }

    pub fn alerts_path(&self, date: NaiveDate) -> PathBuf {
        self.outdir.join(format!("alerts_{}.csv", date.format("%Y%m%d")))
    }

    pub fn summary_path(&self, date: NaiveDate) -> PathBuf {
        self.outdir.join(format!("summary_{}.md", date.format("%Y%m%d")))
    }

    /// Append the run's observations to the cumulative history.
    ///
    /// The header row is written only when the file is first created, so
    /// repeated runs grow the log strictly additively.
    pub fn append_history(&self, observations: &[Observation]) -> Result<PathBuf> {
        let path = self.history_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open history file {}", path.display()))?;

        // a zero-row run can leave the file empty, so an existing file is
        // not proof the header was ever written
        let needs_header = file
            .metadata()
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for observation in observations {
            writer
                .serialize(observation)
                .context("failed to write observation row")?;
        }
        writer.flush().context("failed to flush history file")?;

        info!(rows = observations.len(), path = %path.display(), "history appended");
        Ok(path)
    }

    /// Write the day's alert table; skipped entirely when no alerts fired.
    pub fn write_alerts(&self, alerts: &[Alert], date: NaiveDate) -> Result<Option<PathBuf>> {
        if alerts.is_empty() {
            return Ok(None);
        }

        let path = self.alerts_path(date);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create alert file {}", path.display()))?;
        for alert in alerts {
            writer.serialize(alert).context("failed to write alert row")?;
        }
        writer.flush().context("failed to flush alert file")?;

        info!(alerts = alerts.len(), path = %path.display(), "alert table written");
        Ok(Some(path))
    }

    /// Write the textual run summary.
    pub fn write_summary(
        &self,
        date: NaiveDate,
        target_count: usize,
        alerts: &[Alert],
    ) -> Result<PathBuf> {
        let path = self.summary_path(date);
        let mut body = String::new();
        body.push_str(&format!("# Price Monitor – {date}\n\n"));
        body.push_str(&format!("- Targets: **{target_count}**\n"));
        body.push_str(&format!("- Alerts: **{}**\n\n", alerts.len()));

        if !alerts.is_empty() {
            body.push_str("## Alerts\n");
            for alert in alerts {
                body.push_str(&format!(
                    "- **{} – {}**: {} · Ours: {} · Competitor: {} · {}\n",
                    alert.sku,
                    alert.name,
                    alert.reason.label(),
                    alert.our_price,
                    alert
                        .competitor_price
                        .map_or_else(|| "n/a".to_string(), |p| format!("{p}")),
                    alert
                        .delta_pct
                        .map_or_else(String::new, |p| format!("{:.2}%", p)),
                ));
            }
        }

        std::fs::write(&path, body)
            .with_context(|| format!("failed to write summary {}", path.display()))?;
        Ok(path)
    }
}

/// Convenience for tests and callers that need to re-read the log.
pub fn read_history(path: &Path) -> Result<Vec<Observation>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open history file {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<Observation>() {
        rows.push(record.context("failed to parse history row")?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AlertReason, StockStatus, Target};
    use tempfile::TempDir;

    fn observation(date: NaiveDate) -> Observation {
        let target = Target {
            sku: "SKU1".into(),
            name: "Widget".into(),
            our_price: 50.0,
            url: "https://example.com/w".into(),
            price_selector: ".price".into(),
            stock_selector: None,
        };
        Observation::from_reading(&target, date, Some(45.0), StockStatus::InStock)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn rerun_appends_without_duplicate_header() {
        let dir = TempDir::new().unwrap();
        let sink = HistorySink::new(dir.path());
        sink.ensure_outdir().unwrap();

        sink.append_history(&[observation(date())]).unwrap();
        sink.append_history(&[observation(date())]).unwrap();

        let rows = read_history(&sink.history_path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], rows[1]);

        let raw = std::fs::read_to_string(sink.history_path()).unwrap();
        assert_eq!(raw.matches("date,sku").count(), 1);
    }

    #[test]
    fn empty_run_does_not_poison_the_header() {
        let dir = TempDir::new().unwrap();
        let sink = HistorySink::new(dir.path());
        sink.ensure_outdir().unwrap();

        // zero observations leave an empty file behind
        sink.append_history(&[]).unwrap();
        assert_eq!(std::fs::metadata(sink.history_path()).unwrap().len(), 0);

        sink.append_history(&[observation(date())]).unwrap();

        let raw = std::fs::read_to_string(sink.history_path()).unwrap();
        assert!(raw.starts_with("date,sku"));
        let rows = read_history(&sink.history_path()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn undefined_deltas_render_as_empty_fields() {
        let dir = TempDir::new().unwrap();
        let sink = HistorySink::new(dir.path());
        sink.ensure_outdir().unwrap();

        let target = Target {
            sku: "SKU2".into(),
            name: String::new(),
            our_price: 10.0,
            url: "https://example.com/g".into(),
            price_selector: ".price".into(),
            stock_selector: None,
        };
        let obs = Observation::failed(&target, date(), "HTTP 503");
        sink.append_history(&[obs]).unwrap();

        let raw = std::fs::read_to_string(sink.history_path()).unwrap();
        let data_line = raw.lines().nth(1).unwrap();
        let fields: Vec<&str> = data_line.split(',').collect();
        // competitor_price, diff_abs, diff_pct all empty, never zero
        assert_eq!(&fields[4..7], &["", "", ""]);
    }

    #[test]
    fn no_alert_file_without_alerts() {
        let dir = TempDir::new().unwrap();
        let sink = HistorySink::new(dir.path());
        sink.ensure_outdir().unwrap();

        let written = sink.write_alerts(&[], date()).unwrap();
        assert_eq!(written, None);
        assert!(!sink.alerts_path(date()).exists());
    }

    #[test]
    fn alert_table_and_summary_cover_the_run() {
        let dir = TempDir::new().unwrap();
        let sink = HistorySink::new(dir.path());
        sink.ensure_outdir().unwrap();

        let alert = Alert {
            date: date(),
            sku: "SKU1".into(),
            name: "Widget".into(),
            our_price: 50.0,
            competitor_price: Some(40.0),
            delta_pct: Some(-20.0),
            reason: AlertReason::PriceUndercut,
        };

        let written = sink.write_alerts(std::slice::from_ref(&alert), date()).unwrap();
        assert_eq!(written, Some(sink.alerts_path(date())));
        let raw = std::fs::read_to_string(sink.alerts_path(date())).unwrap();
        assert!(raw.contains("price_undercut"));

        let summary = sink.write_summary(date(), 3, &[alert]).unwrap();
        let text = std::fs::read_to_string(summary).unwrap();
        assert!(text.contains("Targets: **3**"));
        assert!(text.contains("Alerts: **1**"));
        assert!(text.contains("-20.00%"));
    }
}
