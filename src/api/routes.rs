use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{dashboard_page, health, latest_snapshot, refresh_dashboard, snapshot_json};
use super::state::SharedState;

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/refresh", post(refresh_dashboard))
        .route("/api/snapshot", get(snapshot_json))
        .route("/api/snapshot/latest", get(latest_snapshot))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
