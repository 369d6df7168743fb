use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::AppState;
use super::handlers;

/// Create the router with the single form route and request tracing.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::predict))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
