//! Sync job implementation.
//!
//! Items are processed strictly one after another, with a throttle delay
//! between consecutive items. A failing item is recorded and skipped; it
//! never aborts the run.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogStore, MovieFields};
use crate::crossref::{CrossRefReport, CrossReferenceMaintainer};
use crate::metrics::{
    RATE_LIMIT_RETRIES, SYNC_ITEMS, SYNC_ITEM_FAILURES, SYNC_PAGES_FAILED, SYNC_RUNS,
    SYNC_RUN_DURATION,
};
use crate::provider::{MetadataProvider, MovieDetail, MovieSummary, ProviderError};

use super::config::SyncConfig;
use super::types::{SyncError, SyncKind, SyncPhase, SyncStatus, SyncSummary};

/// Clears the running flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Pulls movies from the provider into the catalog.
pub struct SyncJob {
    config: SyncConfig,
    provider: Arc<dyn MetadataProvider>,
    store: Arc<dyn CatalogStore>,
    maintainer: CrossReferenceMaintainer,

    // Runtime state
    running: AtomicBool,
    phase: RwLock<SyncPhase>,
    current_item: RwLock<Option<u32>>,
    last_summary: RwLock<Option<SyncSummary>>,
}

impl SyncJob {
    /// Create a new sync job.
    pub fn new(
        config: SyncConfig,
        provider: Arc<dyn MetadataProvider>,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        let maintainer = CrossReferenceMaintainer::new(Arc::clone(&store));
        Self {
            config,
            provider,
            store,
            maintainer,
            running: AtomicBool::new(false),
            phase: RwLock::new(SyncPhase::Idle),
            current_item: RwLock::new(None),
            last_summary: RwLock::new(None),
        }
    }

    /// Get the job configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get current job status.
    pub async fn status(&self) -> SyncStatus {
        let running = self.is_running();
        SyncStatus {
            running,
            phase: if running {
                *self.phase.read().await
            } else {
                SyncPhase::Idle
            },
            current_item: if running {
                *self.current_item.read().await
            } else {
                None
            },
            last_summary: self.last_summary.read().await.clone(),
        }
    }

    /// Summary of the most recent completed run.
    pub async fn last_summary(&self) -> Option<SyncSummary> {
        self.last_summary.read().await.clone()
    }

    /// Walk up to `max_pages` pages of the popular listing and sync every
    /// movie on them.
    ///
    /// Fails only if another run is active or every listing page failed;
    /// item failures are reported in the summary.
    pub async fn sync_popular(&self, max_pages: u32) -> Result<SyncSummary, SyncError> {
        let _guard = self.begin(SyncKind::Popular)?;
        let start = Instant::now();

        info!(
            "Starting popular sync via {}: max_pages={}",
            self.provider.name(),
            max_pages
        );

        let mut summary = SyncSummary::new(SyncKind::Popular);
        let mut seen: HashSet<u32> = HashSet::new();
        // Set once an item has hit the provider; the next provider call of
        // any kind waits out the throttle first.
        let mut pending_throttle = false;

        for page in 1..=max_pages {
            if pending_throttle {
                self.throttle().await;
                pending_throttle = false;
            }
            self.set_phase(SyncPhase::FetchingListing).await;

            let listing = match self.provider.fetch_popular_movies(page).await {
                Ok(listing) => listing,
                Err(e) => {
                    warn!("Failed to fetch popular listing page {}: {}", page, e);
                    summary.pages_failed += 1;
                    SYNC_PAGES_FAILED.inc();
                    continue;
                }
            };
            summary.pages_fetched += 1;

            if page > listing.total_pages {
                info!(
                    "Reached end of listing at page {} (total_pages={})",
                    page, listing.total_pages
                );
                break;
            }

            debug!("Listing page {}: {} movies", page, listing.results.len());

            for item in &listing.results {
                if !seen.insert(item.external_id) {
                    debug!("Skipping movie {}: already processed this run", item.external_id);
                    continue;
                }
                if pending_throttle {
                    self.throttle().await;
                }

                self.run_item(item.external_id, Some(item), &mut summary)
                    .await;
                pending_throttle = true;
            }

            if page >= listing.total_pages {
                info!(
                    "Reached end of listing at page {} (total_pages={})",
                    page, listing.total_pages
                );
                break;
            }
        }

        if summary.pages_fetched == 0 && summary.pages_failed > 0 {
            let err = SyncError::ListingUnavailable {
                pages_failed: summary.pages_failed,
            };
            error!("Popular sync failed: {}", err);
            self.finish(summary, start, "listing_unavailable").await;
            return Err(err);
        }

        Ok(self.finish(summary, start, "completed").await)
    }

    /// Re-fetch every movie already in the catalog and re-apply its
    /// cross-references.
    pub async fn resync_existing(&self) -> Result<SyncSummary, SyncError> {
        let _guard = self.begin(SyncKind::Resync)?;
        let start = Instant::now();

        let refs = match self.store.list_movie_refs() {
            Ok(refs) => refs,
            Err(e) => {
                error!("Resync failed to list movies: {}", e);
                SYNC_RUNS
                    .with_label_values(&[SyncKind::Resync.as_str(), "store_unavailable"])
                    .inc();
                self.set_phase(SyncPhase::Idle).await;
                return Err(e.into());
            }
        };

        info!("Starting resync of {} movies", refs.len());

        let mut summary = SyncSummary::new(SyncKind::Resync);
        for (i, movie_ref) in refs.iter().enumerate() {
            if i > 0 {
                self.throttle().await;
            }
            self.run_item(movie_ref.external_id, None, &mut summary)
                .await;
        }

        Ok(self.finish(summary, start, "completed").await)
    }

    /// Claim the single-flight guard.
    fn begin(&self, kind: SyncKind) -> Result<RunGuard<'_>, SyncError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Rejecting {} sync: a run is already in progress", kind.as_str());
            SYNC_RUNS
                .with_label_values(&[kind.as_str(), "rejected"])
                .inc();
            return Err(SyncError::AlreadyRunning);
        }
        Ok(RunGuard(&self.running))
    }

    async fn finish(&self, mut summary: SyncSummary, start: Instant, result: &str) -> SyncSummary {
        summary.finished_at = Utc::now();
        self.set_phase(SyncPhase::Done).await;
        *self.current_item.write().await = None;

        SYNC_RUNS
            .with_label_values(&[summary.kind.as_str(), result])
            .inc();
        SYNC_RUN_DURATION
            .with_label_values(&[summary.kind.as_str()])
            .observe(start.elapsed().as_secs_f64());

        info!(
            "{} sync finished: processed={}, failed={}, pages_fetched={}, pages_failed={}",
            summary.kind.as_str(),
            summary.processed_count,
            summary.failed_count,
            summary.pages_fetched,
            summary.pages_failed
        );

        *self.last_summary.write().await = Some(summary.clone());
        self.set_phase(SyncPhase::Idle).await;
        summary
    }

    /// Process one item and fold the outcome into the summary.
    async fn run_item(
        &self,
        external_id: u32,
        listed: Option<&MovieSummary>,
        summary: &mut SyncSummary,
    ) {
        *self.current_item.write().await = Some(external_id);
        self.set_phase(SyncPhase::ProcessingItem).await;

        match self.process_item(external_id, listed).await {
            Ok(report) => {
                summary.processed_count += 1;
                summary.actors_created += report.actors_created;
                SYNC_ITEMS.with_label_values(&["success"]).inc();
            }
            Err(e) => {
                self.set_phase(SyncPhase::ItemFailed).await;
                warn!("Failed to sync movie {}: {}", external_id, e);
                summary.record_failure(external_id, &e);
                SYNC_ITEMS.with_label_values(&["failed"]).inc();
                SYNC_ITEM_FAILURES.with_label_values(&[e.kind()]).inc();
            }
        }
    }

    async fn process_item(
        &self,
        external_id: u32,
        listed: Option<&MovieSummary>,
    ) -> Result<CrossRefReport, SyncError> {
        let detail = self.fetch_detail(external_id).await?;

        debug!(
            "Syncing movie {}: {} ({:?}), {} cast, {} directors",
            external_id,
            detail.title,
            detail.year(),
            detail.cast.len(),
            detail.directors.len()
        );

        let movie = self
            .store
            .upsert_movie(external_id, &merged_fields(listed, &detail))?;
        let report = self.maintainer.apply(movie.id, &detail)?;

        if !report.is_consistent() {
            return Err(SyncError::ReferenceConsistencyFailed {
                external_id,
                failed_actors: report
                    .failures
                    .iter()
                    .map(|f| f.actor_external_id)
                    .collect(),
            });
        }
        Ok(report)
    }

    /// Fetch details, waiting out rate limits up to the configured retries.
    async fn fetch_detail(&self, external_id: u32) -> Result<MovieDetail, SyncError> {
        let mut retries = 0;
        loop {
            match self.provider.fetch_movie_detail(external_id).await {
                Err(ProviderError::RateLimited { retry_after_secs })
                    if retries < self.config.rate_limit_retries =>
                {
                    retries += 1;
                    let wait = retry_after_secs
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| Duration::from_millis(self.config.rate_limit_backoff_ms))
                        .min(Duration::from_millis(self.config.max_retry_wait_ms));
                    warn!(
                        "Rate limited fetching movie {}, retry {}/{} in {:?}",
                        external_id, retries, self.config.rate_limit_retries, wait
                    );
                    RATE_LIMIT_RETRIES.inc();

                    self.set_phase(SyncPhase::Throttling).await;
                    tokio::time::sleep(wait).await;
                    self.set_phase(SyncPhase::ProcessingItem).await;
                }
                other => return other.map_err(SyncError::from),
            }
        }
    }

    async fn throttle(&self) {
        if self.config.throttle_delay_ms == 0 {
            return;
        }
        self.set_phase(SyncPhase::Throttling).await;
        tokio::time::sleep(Duration::from_millis(self.config.throttle_delay_ms)).await;
    }

    async fn set_phase(&self, phase: SyncPhase) {
        *self.phase.write().await = phase;
    }
}

/// Movie fields for an upsert: detail values win, listing values fill gaps.
pub fn merged_fields(listed: Option<&MovieSummary>, detail: &MovieDetail) -> MovieFields {
    let title = if detail.title.is_empty() {
        listed.map(|s| s.title.clone()).unwrap_or_default()
    } else {
        detail.title.clone()
    };

    MovieFields {
        title,
        original_title: detail
            .original_title
            .clone()
            .or_else(|| listed.and_then(|s| s.original_title.clone())),
        overview: detail
            .overview
            .clone()
            .or_else(|| listed.and_then(|s| s.overview.clone())),
        poster_path: detail
            .poster_path
            .clone()
            .or_else(|| listed.and_then(|s| s.poster_path.clone())),
        backdrop_path: detail
            .backdrop_path
            .clone()
            .or_else(|| listed.and_then(|s| s.backdrop_path.clone())),
        release_date: detail
            .release_date
            .clone()
            .or_else(|| listed.and_then(|s| s.release_date.clone())),
        vote_average: detail.vote_average.or(listed.and_then(|s| s.vote_average)),
        vote_count: detail.vote_count.or(listed.and_then(|s| s.vote_count)),
        popularity: detail.popularity.or(listed.and_then(|s| s.popularity)),
        genres: detail.genres.clone(),
        videos: detail.videos.clone(),
    }
}
