//! API route handlers
//!
//! - `GET /`, `GET /health`: liveness
//! - `POST /task`: run one task payload through the dispatcher

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::tasks::TaskDispatcher;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: TaskDispatcher,
}

impl ApiState {
    pub fn new(dispatcher: TaskDispatcher) -> Self {
        Self { dispatcher }
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub health_check: &'static str,
}

/// GET / and GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { health_check: "OK" })
}

/// POST /task
///
/// The body is parsed here rather than by the `Json` extractor so malformed
/// JSON gets the same error envelope as every other rejection.
pub async fn run_task(State(state): State<ApiState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return ApiErrorResponse::bad_request("INVALID_PAYLOAD", format!("body is not valid JSON: {e}"))
        }
    };

    // Dispatch does blocking store I/O
    let dispatcher = state.dispatcher.clone();
    let joined = tokio::task::spawn_blocking(move || dispatcher.dispatch(&payload)).await;

    match joined {
        Ok(Ok(outcome)) => ApiResponse::ok(outcome.into_json()),
        Ok(Err(e)) => ApiErrorResponse::from_task_error(&e),
        Err(e) => {
            error!(error = %e, "Task worker failed");
            ApiErrorResponse::internal("task worker failed")
        }
    }
}
