// src/api.rs
//! Request/response channel between the dashboard host and the fetch core.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config::DeepSpaceConfig;
use crate::delivery::SnapshotStore;
use crate::ingest::scheduler::FetchScheduler;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<FetchScheduler>,
    pub store: SnapshotStore,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/events", get(events))
        .route("/config", get(current_config).post(replace_config))
        .route("/refresh", post(refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn events(State(state): State<AppState>) -> Response {
    match state.store.latest() {
        Some(set) => Json(set.as_ref().clone()).into_response(),
        None => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "status": "loading" })),
        )
            .into_response(),
    }
}

async fn current_config(State(state): State<AppState>) -> Json<DeepSpaceConfig> {
    Json(state.scheduler.config().as_ref().clone())
}

async fn replace_config(
    State(state): State<AppState>,
    Json(cfg): Json<DeepSpaceConfig>,
) -> Response {
    tracing::info!(target: "dss", "received config");
    match state.scheduler.configure(cfg) {
        Ok(()) => (StatusCode::ACCEPTED, "rescheduled").into_response(),
        Err(e) => {
            tracing::warn!(target: "dss", error = %e, "config rejected");
            (StatusCode::UNPROCESSABLE_ENTITY, format!("{e:#}")).into_response()
        }
    }
}

async fn refresh(State(state): State<AppState>) -> Response {
    match state.scheduler.refresh_now().await {
        Some(set) => Json(set).into_response(),
        None => (StatusCode::CONFLICT, "cycle in flight, superseded or not configured").into_response(),
    }
}
