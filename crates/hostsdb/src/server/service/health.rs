//! Liveness, readiness and pool telemetry endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hostsdb_storage::PoolStats;
use serde_json::{json, Value};
use tracing::warn;

use super::AppState;

/// `GET /health`
///
/// Answers without touching the datastore.
pub async fn health() -> Json<Value> {
    Json(json!({ "health": "alive" }))
}

/// `GET /ready`
///
/// 200 when the datastore answers a ping, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> Response {
    match state.store().ping().await {
        Ok(()) => Json(json!({ "ready": true })).into_response(),
        Err(e) => {
            warn!(error = %e, "Readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "ready": false, "error": e.root_message() })),
            )
                .into_response()
        }
    }
}

/// `GET /dbstats`
pub async fn dbstats(State(state): State<AppState>) -> Json<PoolStats> {
    Json(state.store().pool_stats())
}
