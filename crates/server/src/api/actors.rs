//! Actor API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use reelsync_core::ActorRecord;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// GET /api/v1/actors/{external_id}
///
/// Get an actor with its filmography, by provider person ID.
pub async fn get_actor(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<u32>,
) -> Result<Json<ActorRecord>, ApiError> {
    match state.store().find_actor_by_external_id(external_id) {
        Ok(Some(actor)) => Ok(Json(actor)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Actor not found: {}", external_id),
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
