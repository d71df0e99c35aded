use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tengine_core::{ProbeSnapshot, SanitizedConfig};

use crate::metrics::encode_metrics;
use crate::state::AppState;

/// GET /ready
///
/// Runs a probe if the last result is older than the probe interval.
pub async fn ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ProbeSnapshot>) {
    let snapshot = state.probe().check_ready().await;
    let status = if snapshot.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(snapshot))
}

/// GET /live
pub async fn live(State(state): State<Arc<AppState>>) -> Json<ProbeSnapshot> {
    Json(state.probe().snapshot().await)
}

/// GET /version
pub async fn version(State(state): State<Arc<AppState>>) -> String {
    state.config().transformer.version()
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
