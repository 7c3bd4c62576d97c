use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, jobs, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = upload_limit_bytes(state.config().server.max_upload_mb);

    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Jobs
        .route("/upload", post(jobs::upload))
        .route("/progress", get(jobs::progress))
        .route("/result/{filename}", get(jobs::result))
        .route("/download/{filename}", get(jobs::download))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

fn upload_limit_bytes(max_upload_mb: u64) -> usize {
    usize::try_from(max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
}
