//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sync runs (items processed/failed, pages, run outcomes)
//! - Cross-reference maintenance (actors created, stale edges pruned)
//! - Cascading deletes
//! - The metadata provider (requests, latency)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Sync Metrics
// =============================================================================

/// Sync runs by kind and result.
pub static SYNC_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelsync_sync_runs_total", "Total sync runs"),
        &["kind", "result"], // kind: "popular", "resync"; result: "completed", "listing_unavailable", "rejected"
    )
    .unwrap()
});

/// Sync run duration in seconds.
pub static SYNC_RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("reelsync_sync_run_duration_seconds", "Duration of sync runs")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["kind"],
    )
    .unwrap()
});

/// Items processed by result.
pub static SYNC_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelsync_sync_items_total", "Total catalog items synced"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Item failures by error kind.
pub static SYNC_ITEM_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelsync_sync_item_failures_total",
            "Item failures by error kind",
        ),
        &["kind"],
    )
    .unwrap()
});

/// Listing pages that could not be fetched.
pub static SYNC_PAGES_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelsync_sync_pages_failed_total",
        "Listing pages that failed to fetch",
    )
    .unwrap()
});

/// Rate-limit retries performed.
pub static RATE_LIMIT_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelsync_rate_limit_retries_total",
        "Detail fetches retried after a rate limit",
    )
    .unwrap()
});

// =============================================================================
// Cross-Reference Metrics
// =============================================================================

/// Actors created on first reference.
pub static ACTORS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("reelsync_actors_created_total", "Total actors created").unwrap()
});

/// Stale filmography entries removed.
pub static FILMOGRAPHY_PRUNED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelsync_filmography_pruned_total",
        "Stale filmography entries removed",
    )
    .unwrap()
});

// =============================================================================
// Cascade Metrics
// =============================================================================

/// Cascading deletes by result.
pub static CASCADE_DELETES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelsync_cascade_deletes_total", "Total cascading deletes"),
        &["result"], // "deleted", "missing", "failed"
    )
    .unwrap()
});

// =============================================================================
// Provider Metrics
// =============================================================================

/// Provider requests by endpoint and result.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelsync_provider_requests_total",
            "Total metadata provider requests",
        ),
        &["endpoint", "result"],
    )
    .unwrap()
});

/// Provider request duration in seconds.
pub static PROVIDER_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelsync_provider_request_duration_seconds",
            "Duration of metadata provider requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["endpoint"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sync
        Box::new(SYNC_RUNS.clone()),
        Box::new(SYNC_RUN_DURATION.clone()),
        Box::new(SYNC_ITEMS.clone()),
        Box::new(SYNC_ITEM_FAILURES.clone()),
        Box::new(SYNC_PAGES_FAILED.clone()),
        Box::new(RATE_LIMIT_RETRIES.clone()),
        // Cross-references
        Box::new(ACTORS_CREATED.clone()),
        Box::new(FILMOGRAPHY_PRUNED.clone()),
        // Cascade
        Box::new(CASCADE_DELETES.clone()),
        // Provider
        Box::new(PROVIDER_REQUESTS.clone()),
        Box::new(PROVIDER_REQUEST_DURATION.clone()),
    ]
}
