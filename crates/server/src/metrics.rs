//! Prometheus metrics for the admin server.
//!
//! HTTP metrics are recorded by middleware; catalog sizes and job state are
//! gauges refreshed on every scrape. Sync, provider and cascade counters
//! live in `reelsync_core::metrics` and are registered here.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelsync_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelsync_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelsync_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelsync_auth_failures_total", "Total authentication failures"),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// State gauges (collected on scrape)
// =============================================================================

/// Documents per catalog collection.
pub static CATALOG_DOCUMENTS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("reelsync_catalog_documents", "Stored documents by collection"),
        &["collection"],
    )
    .unwrap()
});

pub static SYNC_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelsync_sync_running",
        "Whether a sync run is in progress (1) or not (0)",
    )
    .unwrap()
});

pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelsync_scheduler_running",
        "Whether the sync scheduler is running (1) or stopped (0)",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    let server_metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(AUTH_FAILURES_TOTAL.clone()),
        Box::new(CATALOG_DOCUMENTS.clone()),
        Box::new(SYNC_RUNNING.clone()),
        Box::new(SCHEDULER_RUNNING.clone()),
    ];

    for metric in server_metrics
        .into_iter()
        .chain(reelsync_core::metrics::all_metrics())
    {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Refresh gauges from current application state.
pub fn collect_dynamic_metrics(state: &AppState) {
    if let Ok(stats) = state.store().stats() {
        for (collection, count) in [
            ("movies", stats.movies),
            ("actors", stats.actors),
            ("filmography_entries", stats.filmography_entries),
            ("comments", stats.comments),
            ("favorites", stats.favorites),
        ] {
            CATALOG_DOCUMENTS
                .with_label_values(&[collection])
                .set(count as i64);
        }
    }

    SYNC_RUNNING.set(state.sync_job().is_running() as i64);
    SCHEDULER_RUNNING.set(
        state
            .scheduler()
            .is_some_and(|s| s.status().running) as i64,
    );
}

/// Normalize a path for metric labels (numeric IDs become `{id}`).
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/api/v1/movies/550"), "/api/v1/movies/{id}");
        assert_eq!(normalize_path("/api/v1/actors/287/"), "/api/v1/actors/{id}/");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/sync/popular"), "/api/v1/sync/popular");
        assert_eq!(normalize_path("/api/v1"), "/api/v1");
    }

    #[test]
    fn test_encode_metrics_includes_core_metrics() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();
        reelsync_core::metrics::SYNC_PAGES_FAILED.inc_by(0);

        let output = encode_metrics().unwrap();
        assert!(output.contains("reelsync_http_requests_total"));
        assert!(output.contains("reelsync_sync_pages_failed_total"));
        assert!(output.contains("# TYPE"));
    }
}
