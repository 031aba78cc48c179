//! Sync API handlers.
//!
//! Triggers run the job inline and respond with its summary once it
//! finishes.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use reelsync_core::{SchedulerStatus, SyncError, SyncStatus, SyncSummary};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::handlers::{api_error, ApiError};
use super::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SyncPopularRequest {
    /// Defaults to `sync.max_pages`.
    #[serde(default)]
    pub max_pages: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SyncStatusResponse {
    #[serde(flatten)]
    pub sync: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerStatus>,
}

fn sync_error(e: SyncError) -> ApiError {
    let status = match e {
        SyncError::AlreadyRunning => StatusCode::CONFLICT,
        SyncError::ListingUnavailable { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

/// POST /api/v1/sync/popular
///
/// Body is optional: `{ "max_pages": 3 }`.
pub async fn sync_popular(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> Result<Json<SyncSummary>, ApiError> {
    let request: SyncPopularRequest = if body.is_empty() {
        SyncPopularRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Invalid body: {}", e)))?
    };

    let max_pages = request
        .max_pages
        .unwrap_or(state.config().sync.max_pages);
    if max_pages == 0 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "max_pages must be at least 1",
        ));
    }

    info!("{} triggered popular sync (max_pages={})", user.subject, max_pages);
    state
        .sync_job()
        .sync_popular(max_pages)
        .await
        .map(Json)
        .map_err(sync_error)
}

/// POST /api/v1/sync/resync
pub async fn resync(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<SyncSummary>, ApiError> {
    info!("{} triggered resync", user.subject);
    state
        .sync_job()
        .resync_existing()
        .await
        .map(Json)
        .map_err(sync_error)
}

/// GET /api/v1/sync/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<SyncStatusResponse> {
    Json(SyncStatusResponse {
        sync: state.sync_job().status().await,
        scheduler: state.scheduler().map(|s| s.status()),
    })
}
