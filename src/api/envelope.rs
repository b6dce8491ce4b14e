//! Consistent response envelope for the task API.
//!
//! Every task response is wrapped in either [`ApiResponse`] (success) or
//! [`ApiErrorResponse`] (error), ensuring a uniform JSON shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

use crate::tasks::TaskError;

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Successful response: `{ "data": T, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::default(),
        };
        (StatusCode::OK, axum::Json(body)).into_response()
    }
}

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error response: `{ "error": { "code": "...", "message": "..." }, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: msg.into(),
            },
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn bad_request(code: &str, msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, code, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
    }

    /// Map a task failure to its HTTP status, keeping the task error code.
    pub fn from_task_error(error: &TaskError) -> Response {
        let code = error.code();
        Self::build(status_for_code(code), code, error.to_string())
    }
}

/// HTTP status for a task error code.
///
/// - 400: the payload or query is wrong
/// - 404: the addressed key does not exist
/// - 422: the payload is fine but reference data or settings are missing,
///   or a collection holds more records than one calculation may read
/// - 500: store failures
pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "UNKNOWN_TASK" | "MISSING_FIELDS" | "INVALID_PAYLOAD" | "INVALID_RANGE"
        | "MISSING_PARAMETER" | "FIELD_NOT_PRESENT" => StatusCode::BAD_REQUEST,
        "NOT_FOUND" => StatusCode::NOT_FOUND,
        "MISSING_COEFFICIENT" | "MISSING_SETTING" | "INVALID_SETTING" | "LIMIT_EXCEEDED" => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
