use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::middleware::{auth_middleware, metrics_middleware};
use super::{actors, catalog, handlers, movies, sync};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Probes stay reachable without credentials
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics));

    let admin_routes = Router::new()
        .route("/config", get(handlers::get_config))
        // Sync
        .route("/sync/popular", post(sync::sync_popular))
        .route("/sync/resync", post(sync::resync))
        .route("/sync/status", get(sync::get_status))
        // Catalog
        .route(
            "/movies/{external_id}",
            get(movies::get_movie).delete(movies::delete_movie),
        )
        .route("/actors/{external_id}", get(actors::get_actor))
        .route("/catalog/stats", get(catalog::get_stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = public_routes.merge(admin_routes).with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
