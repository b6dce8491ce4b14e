//! API route definitions
//!
//! - / and /health - liveness probe
//! - /task - task dispatch

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;

use super::handlers::{self, ApiState};
use crate::config::defaults::MAX_CONCURRENT_TASKS;

/// Create all API routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        .route(
            "/task",
            post(handlers::run_task).route_layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_TASKS)),
        )
        .with_state(state)
}
