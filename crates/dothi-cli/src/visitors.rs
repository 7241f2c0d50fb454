use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use dothi_core::{AppConfig, Clock, SystemClock};
use dothi_store::{RealtimeDbClient, VisitorStats, VisitorTracker};

fn print_stats(stats: VisitorStats) {
    println!("total {}  today {}", stats.total, stats.today);
}

/// Counts this run as a visit, prints the totals and, with `watch`, keeps
/// printing changes until interrupted.
pub(crate) async fn run_visitors(config: &AppConfig, watch: Option<u64>) -> anyhow::Result<()> {
    let client = RealtimeDbClient::from_config(config)
        .context("build Realtime Database client")?
        .ok_or_else(|| anyhow::anyhow!("DOTHI_RTDB_URL is not set; visitor counting is disabled"))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tracker = VisitorTracker::with_window(
        Arc::new(client),
        clock,
        Duration::from_secs(config.visitor_stats_window_secs),
    );

    tracker.record_visit().await;
    print_stats(tracker.stats().await);

    let Some(every) = watch else {
        return Ok(());
    };
    let _subscription = tracker.subscribe(Duration::from_secs(every.max(1)), print_stats);
    tokio::signal::ctrl_c()
        .await
        .context("wait for interrupt")?;
    Ok(())
}
