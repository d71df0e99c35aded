use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use super::{handlers, middleware::metrics_middleware, transform};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload = state.config().server.max_upload_bytes;

    Router::new()
        // Transform
        .route("/transform", post(transform::transform))
        // Health
        .route("/ready", get(handlers::ready))
        .route("/live", get(handlers::live))
        // Info
        .route("/version", get(handlers::version))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
