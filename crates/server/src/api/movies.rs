//! Movie API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use reelsync_core::{CascadeReport, CascadeStep, MovieRecord};
use serde::Serialize;
use tracing::info;

use super::handlers::{api_error, ApiError};
use super::middleware::AuthUser;
use crate::state::AppState;

/// Body of a cascade that stopped partway.
#[derive(Debug, Serialize)]
pub struct CascadeFailureResponse {
    pub error: String,
    /// The step that failed. Earlier steps were applied.
    pub step: CascadeStep,
}

/// GET /api/v1/movies/{external_id}
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<u32>,
) -> Result<Json<MovieRecord>, ApiError> {
    match state.store().find_movie_by_external_id(external_id) {
        Ok(Some(movie)) => Ok(Json(movie)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Movie not found: {}", external_id),
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// DELETE /api/v1/movies/{external_id}
///
/// Delete a movie and every reference to it. Safe to repeat after a failure.
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(external_id): Path<u32>,
) -> Result<Json<CascadeReport>, (StatusCode, Json<CascadeFailureResponse>)> {
    info!("{} requested delete of movie {}", user.subject, external_id);

    match state.cascade().delete_movie_by_external_id(external_id) {
        Ok(Some(report)) => Ok(Json(report)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(CascadeFailureResponse {
                error: format!("Movie not found: {}", external_id),
                step: CascadeStep::ResolveMovie,
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CascadeFailureResponse {
                error: e.to_string(),
                step: e.step,
            }),
        )),
    }
}
