//! # RSS News Archiver
//!
//! Polls a list of RSS/Atom feeds, follows every item to its article page for
//! the full text, and appends items newer than each source's watermark to a
//! JSON archive.
//!
//! ## Usage
//!
//! ```sh
//! # Run forever, one cycle at startup and every 3 minutes after
//! rss_news_archiver --data-dir ./data
//!
//! # One cycle, then exit (for cron-style platforms)
//! rss_news_archiver --data-dir ./data --sources sources.yaml --once
//! ```
//!
//! ## Architecture
//!
//! 1. **Scheduling**: a timer triggers cycles; overlapping triggers are skipped
//! 2. **Scraping**: each source's feed is parsed and every item's page fetched
//!    for paragraph text, falling back to the feed's own content
//! 3. **Merging**: items newer than the source watermark are appended
//! 4. **Persistence**: `all_news.json` and `last_dates.json` are rewritten

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod ingest;
mod models;
mod scheduler;
mod scrapers;
mod store;
mod utils;

use cli::Cli;
use ingest::{CycleOutcome, IngestionEngine};
use scrapers::rss::RssScraper;
use store::Store;
use utils::BoxError;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), BoxError> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("rss_news_archiver starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let sources = match args.sources.as_deref() {
        Some(path) => config::load_sources(path).await.inspect_err(|e| {
            error!(path, error = %e, "Could not load sources file");
        })?,
        None => config::default_sources(),
    };
    info!(count = sources.len(), data_dir = %args.data_dir, "Sources configured");

    let store = Store::new(&args.data_dir);
    info!(
        archive = %store.archive_path().display(),
        watermarks = %store.watermark_path().display(),
        "State files"
    );
    let engine = Arc::new(IngestionEngine::new(RssScraper::default(), sources, store));

    if args.once {
        info!("Batch mode: running a single cycle");
        match engine.run_cycle().await {
            CycleOutcome::Completed(report) => {
                for s in &report.sources {
                    debug!(source = %s.source, extracted = s.extracted, added = s.added, "Source summary");
                }
            }
            CycleOutcome::Failed(reason) => error!(%reason, "Batch cycle failed"),
            CycleOutcome::Skipped => {}
        }
        let elapsed = start_time.elapsed();
        info!(?elapsed, secs = elapsed.as_secs(), "Batch run finished");
        return Ok(());
    }

    let handle = scheduler::spawn(engine, Duration::from_secs(args.interval_secs.max(1)));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    handle.abort();

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(())
}
