//! pricewatch CLI entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use pricewatch::application::Monitor;
use pricewatch::infrastructure::config::MonitorConfig;
use pricewatch::infrastructure::fetcher::RetryPolicy;
use pricewatch::infrastructure::http_client::{HttpClient, HttpClientConfig};
use pricewatch::infrastructure::logging::init_logging;
use pricewatch::infrastructure::notifier::{EmailNotifier, SlackNotifier};
use pricewatch::infrastructure::target_loader::load_targets;

#[derive(Parser, Debug)]
#[command(name = "pricewatch", version, about = "Competitor price monitoring and alerting")]
struct Cli {
    /// Path to the targets CSV (sku, name, our_price, url, price_selector, stock_selector)
    targets: PathBuf,

    /// Directory for the history log, alert tables and summaries
    #[arg(short, long, default_value = "outputs")]
    outdir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config = MonitorConfig::from_env()?;
    let targets = load_targets(&cli.targets)?;
    info!(
        targets = targets.len(),
        threshold_pct = config.threshold_pct,
        "starting pricewatch v{}",
        env!("CARGO_PKG_VERSION")
    );

    let source = HttpClient::new(HttpClientConfig::default())?;
    let mut monitor = Monitor::new(source, RetryPolicy::default(), config.clone());

    if let Some(webhook_url) = config.slack_webhook_url.clone() {
        monitor = monitor.with_notifier(Box::new(SlackNotifier::new(webhook_url)?));
    }
    if let Some(email) = config.email.clone() {
        monitor = monitor.with_notifier(Box::new(EmailNotifier::new(email)));
    }

    let report = monitor.run(&targets, &cli.outdir).await?;

    println!(
        "[OK] Monitor finished. Rows: {} | Alerts: {}",
        report.observations, report.alerts
    );
    println!("History: {}", report.history_path.display());
    if let Some(alerts_path) = &report.alerts_path {
        println!("Alerts:  {}", alerts_path.display());
    }
    println!("Summary: {}", report.summary_path.display());

    Ok(())
}
