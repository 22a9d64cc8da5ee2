use crate::ingest::{CycleOutcome, IngestionEngine};
use crate::scrapers::rss::Scrape;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Trigger a cycle now and then every `period` until the handle is aborted.
///
/// Each trigger runs on its own task, so a cycle that outlasts the period
/// meets the engine's single-flight guard instead of delaying the timer.
pub fn spawn<S>(engine: Arc<IngestionEngine<S>>, period: Duration) -> JoinHandle<()>
where
    S: Scrape + Send + Sync + 'static,
{
    info!(period_secs = period.as_secs(), "Fetch cycles scheduled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                if engine.run_cycle().await == CycleOutcome::Skipped {
                    debug!("Scheduled trigger absorbed by running cycle");
                }
            });
        }
    })
}
