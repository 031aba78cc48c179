//! Catalog API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use reelsync_core::CatalogStats;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// GET /api/v1/catalog/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<CatalogStats>, ApiError> {
    state
        .store()
        .stats()
        .map(Json)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
