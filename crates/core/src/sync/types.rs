//! Types for the sync job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::provider::ProviderError;

/// Errors raised while syncing an item or a whole run.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// Network failure or unexpected provider response.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider kept throttling after the retries were spent.
    #[error("provider rate limited")]
    ProviderRateLimited { retry_after_secs: Option<u64> },

    /// The movie no longer exists upstream.
    #[error("movie {0} not found at provider")]
    ProviderNotFound(u32),

    /// A catalog write failed.
    #[error("store write failed: {0}")]
    StoreWriteFailed(String),

    /// Some credited actors could not be linked to the movie.
    #[error("reference consistency failed for movie {external_id}: actors {failed_actors:?}")]
    ReferenceConsistencyFailed {
        external_id: u32,
        failed_actors: Vec<u32>,
    },

    /// Another run is in progress.
    #[error("a sync run is already in progress")]
    AlreadyRunning,

    /// Every listing page failed; nothing was processed.
    #[error("listing unavailable: all {pages_failed} page(s) failed")]
    ListingUnavailable { pages_failed: u32 },
}

impl SyncError {
    /// Short label for metrics and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::ProviderUnavailable(_) => "provider_unavailable",
            SyncError::ProviderRateLimited { .. } => "provider_rate_limited",
            SyncError::ProviderNotFound(_) => "provider_not_found",
            SyncError::StoreWriteFailed(_) => "store_write_failed",
            SyncError::ReferenceConsistencyFailed { .. } => "reference_consistency_failed",
            SyncError::AlreadyRunning => "already_running",
            SyncError::ListingUnavailable { .. } => "listing_unavailable",
        }
    }
}

impl From<ProviderError> for SyncError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::RateLimited { retry_after_secs } => {
                SyncError::ProviderRateLimited { retry_after_secs }
            }
            ProviderError::NotFound(id) => SyncError::ProviderNotFound(id),
            other => SyncError::ProviderUnavailable(other.to_string()),
        }
    }
}

impl From<CatalogError> for SyncError {
    fn from(e: CatalogError) -> Self {
        SyncError::StoreWriteFailed(e.to_string())
    }
}

/// Which operation a run performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    /// Walk the provider's popular listing.
    Popular,
    /// Refresh every movie already in the catalog.
    Resync,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncKind::Popular => "popular",
            SyncKind::Resync => "resync",
        }
    }
}

/// Where the job currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    #[default]
    Idle,
    FetchingListing,
    ProcessingItem,
    ItemFailed,
    Throttling,
    Done,
}

/// One item that failed during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Provider movie ID.
    pub external_id: u32,
    /// Error kind (see [`SyncError::kind`]).
    pub kind: String,
    pub message: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub kind: SyncKind,
    /// Items that completed successfully.
    pub processed_count: usize,
    pub failed_count: usize,
    /// Provider IDs of the failed items, in processing order.
    pub failed_ids: Vec<u32>,
    pub failures: Vec<ItemFailure>,
    /// Listing pages fetched (always 0 for a resync).
    pub pages_fetched: u32,
    /// Listing pages that failed and were skipped.
    pub pages_failed: u32,
    /// Actors created across all items.
    pub actors_created: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncSummary {
    pub(crate) fn new(kind: SyncKind) -> Self {
        let now = Utc::now();
        Self {
            kind,
            processed_count: 0,
            failed_count: 0,
            failed_ids: Vec::new(),
            failures: Vec::new(),
            pages_fetched: 0,
            pages_failed: 0,
            actors_created: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn record_failure(&mut self, external_id: u32, error: &SyncError) {
        self.failed_count += 1;
        self.failed_ids.push(external_id);
        self.failures.push(ItemFailure {
            external_id,
            kind: error.kind().to_string(),
            message: error.to_string(),
        });
    }
}

/// Current state of the sync job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    pub running: bool,
    pub phase: SyncPhase,
    /// Provider ID of the item being processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_summary: Option<SyncSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider_error() {
        let err: SyncError = ProviderError::NotFound(550).into();
        assert!(matches!(err, SyncError::ProviderNotFound(550)));

        let err: SyncError = ProviderError::RateLimited {
            retry_after_secs: Some(2),
        }
        .into();
        assert_eq!(err.kind(), "provider_rate_limited");

        let err: SyncError = ProviderError::Parse("bad json".to_string()).into();
        assert!(matches!(err, SyncError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_from_catalog_error() {
        let err: SyncError = CatalogError::Database("disk full".to_string()).into();
        assert_eq!(
            err.to_string(),
            "store write failed: Database error: disk full"
        );
    }

    #[test]
    fn test_record_failure() {
        let mut summary = SyncSummary::new(SyncKind::Popular);
        summary.record_failure(5, &SyncError::ProviderNotFound(5));

        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.failed_ids, vec![5]);
        assert_eq!(summary.failures[0].kind, "provider_not_found");
    }

    #[test]
    fn test_phase_serialization() {
        assert_eq!(
            serde_json::to_string(&SyncPhase::FetchingListing).unwrap(),
            "\"fetching_listing\""
        );
        assert_eq!(SyncPhase::default(), SyncPhase::Idle);
    }
}
