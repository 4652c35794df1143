use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use super::error::ApiError;
use super::state::SharedState;
use crate::types::models::DashboardSnapshot;
use crate::ui::page::render_dashboard;

async fn refreshed(state: &SharedState) -> Result<Arc<DashboardSnapshot>, ApiError> {
    state.refresh().await.map_err(|e| {
        tracing::error!("Refresh failed: {}", e);
        ApiError::from(e)
    })
}

/// Every page load runs a full fetch before rendering.
pub async fn dashboard_page(State(state): State<SharedState>) -> Result<Html<String>, ApiError> {
    let snapshot = refreshed(&state).await?;
    let page = render_dashboard(&snapshot).map_err(|e| {
        tracing::error!("Rendering dashboard failed: {}", e);
        ApiError::from(e)
    })?;
    Ok(Html(page))
}

/// The refresh button posts here; the redirect back to `/` does the fetch.
pub async fn refresh_dashboard() -> Redirect {
    Redirect::to("/")
}

pub async fn snapshot_json(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let snapshot = refreshed(&state).await?;
    Ok(Json(&*snapshot).into_response())
}

pub async fn latest_snapshot(State(state): State<SharedState>) -> Result<Response, ApiError> {
    match state.latest().await {
        Some(snapshot) => Ok(Json(&*snapshot).into_response()),
        None => Err(ApiError::NotFound("no snapshot has been fetched yet".to_string())),
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
