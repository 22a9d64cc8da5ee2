//! One fetch cycle: scrape every source, merge strictly-newer items into the
//! archive, advance watermarks, persist.
//!
//! # Watermarks
//!
//! Acceptance compares parsed timestamps: an item is appended when its date is
//! later than the source's watermark as it stood when the source was reached.
//! The stored watermark, however, only moves when an accepted item's raw date
//! string sorts after the stored string. For uniform ISO-8601 UTC dates the
//! two orders agree. For mixed formats they do not, and the watermark can end
//! up behind the newest accepted item (see the `mixed_formats` tests).
//! Items that fail the timestamp check (older, or with an unparseable date)
//! never move the watermark, whatever their string order.
//!
//! Items are never deduplicated by identity; the date check is the only gate.

use crate::config::EPOCH_WATERMARK;
use crate::models::{Archive, NewsItem, SourceDescriptor, WatermarkMap};
use crate::scrapers::rss::Scrape;
use crate::store::Store;
use crate::utils::{BoxError, item_hash, parse_timestamp};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    pub extracted: usize,
    pub added: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub before: usize,
    pub added: usize,
    pub after: usize,
    pub sources: Vec<SourceReport>,
}

impl CycleReport {
    pub fn is_consistent(&self) -> bool {
        self.before + self.added == self.after
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was already running; nothing was touched.
    Skipped,
    Completed(CycleReport),
    /// The cycle aborted before persisting; the message is the error text.
    Failed(String),
}

/// Clears the running flag on every exit path, unwinding included.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct IngestionEngine<S> {
    scraper: S,
    sources: Vec<SourceDescriptor>,
    store: Store,
    running: AtomicBool,
}

impl<S: Scrape> IngestionEngine<S> {
    pub fn new(scraper: S, sources: Vec<SourceDescriptor>, store: Store) -> Self {
        Self {
            scraper,
            sources,
            store,
            running: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one cycle unless one is already in flight.
    pub async fn run_cycle(&self) -> CycleOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Previous fetch cycle still running; skipping this trigger");
            return CycleOutcome::Skipped;
        }
        let _guard = RunningGuard(&self.running);

        info!(started_at = %Utc::now().to_rfc3339(), sources = self.sources.len(), "Fetch cycle started");

        match self.execute().await {
            Ok(report) => {
                info!(
                    before = report.before,
                    added = report.added,
                    after = report.after,
                    consistent = report.is_consistent(),
                    "Fetch cycle complete"
                );
                CycleOutcome::Completed(report)
            }
            Err(e) => {
                error!(error = %e, details = ?e, "Fetch cycle failed; nothing persisted");
                CycleOutcome::Failed(e.to_string())
            }
        }
    }

    #[instrument(level = "debug", skip_all)]
    async fn execute(&self) -> Result<CycleReport, BoxError> {
        self.store.ensure_files().await?;

        let mut archive = self.store.load_archive().await;
        let mut marks = self.store.load_watermarks().await;
        let before = archive.len();

        let mut reports = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let items = self.scraper.scrape(source).await;
            let extracted = items.len();
            let added = merge_source(&source.name, items, &mut archive, &mut marks);
            info!(source = %source.name, extracted, added, "Source merged");
            reports.push(SourceReport {
                source: source.name.clone(),
                extracted,
                added,
            });
        }

        self.store.save_archive(&archive).await?;
        self.store.save_watermarks(&marks).await?;

        Ok(CycleReport {
            before,
            added: reports.iter().map(|r| r.added).sum(),
            after: archive.len(),
            sources: reports,
        })
    }
}

/// Append the items of one source that are newer than its watermark.
///
/// The threshold is read once, before any item is considered, so every item in
/// the batch is judged against the watermark from previous cycles. Returns the
/// number of items appended.
pub fn merge_source(
    source: &str,
    items: Vec<NewsItem>,
    archive: &mut Archive,
    marks: &mut WatermarkMap,
) -> usize {
    let last_seen = marks
        .get(source)
        .cloned()
        .unwrap_or_else(|| EPOCH_WATERMARK.to_string());
    let threshold = parse_timestamp(&last_seen);
    if threshold.is_none() {
        warn!(source, watermark = %last_seen, "Stored watermark is not a timestamp; no item can pass it");
    }

    let mut added = 0usize;
    for item in items {
        if !item.has_date() || !is_newer(&item.date, threshold) {
            continue;
        }

        // String order, not timestamp order.
        let advance = marks
            .get(source)
            .is_none_or(|mark| item.date.as_str() > mark.as_str());
        if advance {
            marks.insert(source.to_string(), item.date.clone());
        }

        debug!(
            source,
            item_id = %item_hash(&item.title, &item.link),
            date = %item.date,
            "Accepted item"
        );
        archive.push(item);
        added += 1;
    }
    added
}

fn is_newer(date: &str, threshold: Option<DateTime<Utc>>) -> bool {
    match (parse_timestamp(date), threshold) {
        (Some(date), Some(threshold)) => date > threshold,
        _ => false,
    }
}
