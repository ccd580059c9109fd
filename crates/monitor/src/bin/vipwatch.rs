//! vipwatch — polls the controller for VIP client health and emails
//! alerts when a client degrades below the configured floors.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use vipwatch_core::config::{load_dotenv, Config};
use vipwatch_monitor::composer::Composer;
use vipwatch_monitor::runner::Monitor;
use vipwatch_monitor::watchlist::WatchlistDoc;
use vipwatch_notify::{EmailNotifier, Notifier};
use vipwatch_telemetry::{ControllerClient, TelemetrySource};

// ── CLI ─────────────────────────────────────────────────────────────

/// VIP client health monitor — polls controller telemetry and emails alerts.
#[derive(Parser, Debug)]
#[command(name = "vipwatch", version, about)]
struct Cli {
    /// Path to the watchlist YAML file.
    #[arg(long, env = "WATCHLIST_PATH")]
    watchlist: Option<PathBuf>,

    /// Run a single poll cycle and exit.
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Compose alerts but never dispatch them.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Seconds between poll cycles.
    #[arg(long, env = "POLL_INTERVAL_SECS")]
    poll_interval: Option<u64>,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let config = Config::from_env();
    config.log_summary();
    config.controller.require()?;

    let watchlist_path = cli
        .watchlist
        .unwrap_or_else(|| config.monitor.watchlist_path.clone());
    let watchlist = WatchlistDoc::from_path(&watchlist_path)?;
    info!(
        path = %watchlist_path.display(),
        users = watchlist.users.len(),
        devices = watchlist.devices.len(),
        "watchlist loaded"
    );

    let composer = Composer::new(watchlist.templates.as_ref())?;
    let source: Arc<dyn TelemetrySource> = Arc::new(ControllerClient::new(&config.controller)?);

    let mut channels: Vec<Box<dyn Notifier>> = Vec::new();
    if cli.dry_run {
        info!("dry run: alerts will be composed but not dispatched");
    } else {
        config.smtp.require()?;
        channels.push(Box::new(EmailNotifier::from_config(&config.smtp)?));
    }

    let monitor = Monitor::new(source, channels, composer, watchlist.policy()).dry_run(cli.dry_run);

    let poll_interval = Duration::from_secs(
        cli.poll_interval
            .unwrap_or(config.monitor.poll_interval_secs),
    );

    loop {
        let summary = monitor
            .run_cycle(&watchlist.users, &watchlist.devices)
            .await;
        info!(
            entities = summary.entities,
            dispatched = summary.dispatched,
            dispatch_failures = summary.dispatch_failures,
            suppressed = summary.suppressed,
            not_alerting = summary.not_alerting,
            skipped = summary.skipped,
            "poll cycle complete"
        );

        if cli.once {
            break;
        }
        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}
