//! Feed reconciliation loop
//!
//! Walks registered feeds, records every observed release in the ledger,
//! resolves each entry to a tracked series, asks the duplicate detector for a
//! verdict, and routes non-duplicates to the download trigger. Candidates are
//! processed independently: one entry's parse failure or ledger error never
//! aborts the rest of the batch.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::db::{CreateRelease, Database, ReleaseRecord, SeriesRecord};
use crate::services::duplicate::DuplicateDetector;
use crate::services::release_parser::normalize_title;
use crate::services::rss::{FeedItem, RssService};

/// Reason recorded on releases suppressed by duplicate detection
pub const SKIP_DUPLICATE_EPISODE: &str = "duplicate-episode";

/// Downstream acquisition boundary.
///
/// Implementations own the actual fetch and are responsible for flipping the
/// release's acquired flag once the download succeeds; the reconciliation
/// loop only hands candidates over.
#[async_trait]
pub trait DownloadTrigger: Send + Sync {
    async fn enqueue(&self, release: &ReleaseRecord, series: &SeriesRecord) -> Result<()>;
}

/// Trigger that only logs, for running without a download client attached
pub struct LogOnlyTrigger;

#[async_trait]
impl DownloadTrigger for LogOnlyTrigger {
    async fn enqueue(&self, release: &ReleaseRecord, series: &SeriesRecord) -> Result<()> {
        info!(
            release = %release.name,
            series = %series.official_title,
            "Would enqueue download (no client configured)"
        );
        Ok(())
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug, Default, Clone)]
pub struct ReconcileSummary {
    /// Feed entries inspected
    pub items_seen: usize,
    /// Entries already flagged acquired in the ledger
    pub already_acquired: usize,
    /// Entries suppressed as duplicate episodes
    pub suppressed: usize,
    /// Entries handed to the download trigger
    pub triggered: usize,
    /// Entries with no resolvable series, passed through untouched
    pub unmatched: usize,
    /// Entries that failed individually (upsert, ledger, or trigger errors)
    pub errors: usize,
}

/// Sequences feed ingestion, duplicate detection, and download dispatch
pub struct ReconcileService {
    db: Database,
    rss: RssService,
    detector: DuplicateDetector,
    trigger: Arc<dyn DownloadTrigger>,
}

impl ReconcileService {
    pub fn new(db: Database, rss: RssService, trigger: Arc<dyn DownloadTrigger>) -> Self {
        let detector = DuplicateDetector::new(db.clone());
        Self {
            db,
            rss,
            detector,
            trigger,
        }
    }

    /// Run one reconciliation pass over all enabled feeds.
    ///
    /// `skip_duplicate_episodes` is the detection toggle, passed explicitly
    /// so callers (and tests) can vary it per pass without ambient state.
    pub async fn run_pass(&self, skip_duplicate_episodes: bool) -> Result<ReconcileSummary> {
        let feeds = self.db.feeds().list_enabled().await?;
        let mut summary = ReconcileSummary::default();

        for feed in &feeds {
            let items = match self.rss.fetch_feed(&feed.url).await {
                Ok(items) => {
                    self.db.feeds().record_poll(feed.id, None).await?;
                    items
                }
                Err(e) => {
                    warn!(feed = %feed.name, error = %e, "Feed fetch failed");
                    self.db
                        .feeds()
                        .record_poll(feed.id, Some(&e.to_string()))
                        .await?;
                    continue;
                }
            };

            let feed_summary = self
                .reconcile_items(&items, skip_duplicate_episodes)
                .await?;
            summary.merge(feed_summary);
        }

        info!(
            feeds = feeds.len(),
            items = summary.items_seen,
            suppressed = summary.suppressed,
            triggered = summary.triggered,
            unmatched = summary.unmatched,
            errors = summary.errors,
            "Reconciliation pass complete"
        );

        Ok(summary)
    }

    /// Reconcile a batch of feed items against the ledger.
    ///
    /// Only fails if the series list itself cannot be loaded; every per-item
    /// failure is logged, counted, and skipped.
    pub async fn reconcile_items(
        &self,
        items: &[FeedItem],
        skip_duplicate_episodes: bool,
    ) -> Result<ReconcileSummary> {
        let series_index = self.build_series_index().await?;
        let mut summary = ReconcileSummary::default();

        for item in items {
            summary.items_seen += 1;

            let release = match self
                .db
                .releases()
                .upsert_by_url(CreateRelease {
                    series_id: None,
                    name: item.title.clone(),
                    url: item.link.clone(),
                })
                .await
            {
                Ok(release) => release,
                Err(e) => {
                    error!(title = %item.title, error = %e, "Failed to record release");
                    summary.errors += 1;
                    continue;
                }
            };

            if release.acquired {
                debug!(release = %release.name, "Already acquired, nothing to do");
                summary.already_acquired += 1;
                continue;
            }

            // Resolve the owning series from the parsed title; entries for
            // untracked shows are outside detection's jurisdiction
            let Some(series) = self.resolve_series(item, &series_index, &release) else {
                debug!(title = %item.title, "No tracked series for entry, passing through");
                summary.unmatched += 1;
                continue;
            };

            let release = match self.ensure_series_assigned(release, series).await {
                Ok(release) => release,
                Err(e) => {
                    error!(title = %item.title, error = %e, "Failed to assign series");
                    summary.errors += 1;
                    continue;
                }
            };

            match self
                .detector
                .is_duplicate(&release, series, skip_duplicate_episodes)
                .await
            {
                Ok(true) => {
                    info!(
                        release = %release.name,
                        series = %series.official_title,
                        "Suppressing duplicate episode"
                    );
                    if let Err(e) = self
                        .db
                        .releases()
                        .mark_skipped(release.id, SKIP_DUPLICATE_EPISODE)
                        .await
                    {
                        error!(release = %release.name, error = %e, "Failed to record skip");
                        summary.errors += 1;
                        continue;
                    }
                    summary.suppressed += 1;
                }
                Ok(false) => match self.trigger.enqueue(&release, series).await {
                    Ok(()) => {
                        debug!(release = %release.name, "Handed to download trigger");
                        summary.triggered += 1;
                    }
                    Err(e) => {
                        warn!(release = %release.name, error = %e, "Download trigger failed");
                        summary.errors += 1;
                    }
                },
                Err(e) => {
                    // Ledger outage or caller error on this one candidate;
                    // the rest of the batch still gets processed
                    error!(release = %release.name, error = %e, "Duplicate check failed");
                    summary.errors += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Map normalized titles (official and raw) to their series
    async fn build_series_index(&self) -> Result<HashMap<String, SeriesRecord>> {
        let all = self.db.series().list_all().await?;
        let mut index = HashMap::new();
        for series in all {
            index.insert(normalize_title(&series.official_title), series.clone());
            index.insert(normalize_title(&series.title_raw), series);
        }
        Ok(index)
    }

    /// Find the tracked series an item belongs to, preferring an existing
    /// ledger assignment over title matching
    fn resolve_series<'a>(
        &self,
        item: &FeedItem,
        index: &'a HashMap<String, SeriesRecord>,
        release: &ReleaseRecord,
    ) -> Option<&'a SeriesRecord> {
        if let Some(series_id) = release.series_id {
            return index.values().find(|s| s.id == series_id);
        }

        let title = item.parsed.title.as_deref()?;
        index.get(&normalize_title(title))
    }

    async fn ensure_series_assigned(
        &self,
        release: ReleaseRecord,
        series: &SeriesRecord,
    ) -> Result<ReleaseRecord> {
        if release.series_id.is_some() {
            return Ok(release);
        }
        self.db.releases().assign_series(release.id, series.id).await?;
        Ok(ReleaseRecord {
            series_id: Some(series.id),
            ..release
        })
    }
}

impl ReconcileSummary {
    fn merge(&mut self, other: ReconcileSummary) {
        self.items_seen += other.items_seen;
        self.already_acquired += other.already_acquired;
        self.suppressed += other.suppressed;
        self.triggered += other.triggered;
        self.unmatched += other.unmatched;
        self.errors += other.errors;
    }
}
