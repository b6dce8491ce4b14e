//! Task dispatch
//!
//! A task payload is a flat JSON object naming a `task` and carrying the
//! fields that task needs. Dispatch runs in two phases:
//! 1. Parse: task name, required fields and field types are checked and the
//!    payload becomes a typed `TaskRequest`. Nothing is read or written.
//! 2. Execute: the request runs against the stores.
//!
//! Any failure in phase 1 leaves every store untouched.

mod dispatcher;
mod request;

pub use dispatcher::TaskDispatcher;
pub use request::TaskRequest;

use serde_json::Value;
use thiserror::Error;

use crate::engine::EngineError;
use crate::query::QueryError;
use crate::storage::StoreError;

// ============================================================================
// Task Kinds
// ============================================================================

/// Every task the dispatcher understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    CalculateBg,
    ReturnCache,
    DeleteCache,
    DeleteBgCollection,
    GetAppSetting,
    EditAppSetting,
}

impl TaskKind {
    pub const ALL: [Self; 6] = [
        Self::CalculateBg,
        Self::ReturnCache,
        Self::DeleteCache,
        Self::DeleteBgCollection,
        Self::GetAppSetting,
        Self::EditAppSetting,
    ];

    /// Wire name as carried in the `task` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CalculateBg => "calculate_bg",
            Self::ReturnCache => "return_cache",
            Self::DeleteCache => "delete_cache",
            Self::DeleteBgCollection => "delete_bg_collection",
            Self::GetAppSetting => "get_app_setting",
            Self::EditAppSetting => "edit_app_setting",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Keys the payload must contain for this task
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::CalculateBg => &["start_ts", "end_ts", "asset_id", "task"],
            Self::ReturnCache
            | Self::DeleteCache
            | Self::DeleteBgCollection
            | Self::GetAppSetting => &["asset_id", "task"],
            Self::EditAppSetting => &["asset_id", "task", "new_setting"],
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Outcome & Errors
// ============================================================================

/// Successful result of a task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// Side effects done, nothing to return
    Completed,
    /// Fetched value; `Value::Null` when the store holds nothing
    Value(Value),
}

impl TaskOutcome {
    pub fn into_json(self) -> Value {
        match self {
            Self::Completed => Value::Null,
            Self::Value(v) => v,
        }
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid task: {0}")]
    UnknownTask(String),

    #[error("missing items in the event for {task}: {}", .required.join(", "))]
    MissingFields {
        task: TaskKind,
        required: Vec<&'static str>,
    },

    #[error("invalid payload field '{field}': {reason}")]
    InvalidPayload { field: String, reason: String },

    #[error("no motor coefficient for drill string '{0}'")]
    MissingCoefficient(String),

    #[error("no app setting for asset {0}")]
    MissingSetting(i64),

    #[error("app setting for asset {asset_id} has unusable bit_wear_constant {value}")]
    InvalidSetting { asset_id: i64, value: f64 },

    #[error("'{collection}' has more than {limit} matching records")]
    LimitExceeded { collection: String, limit: usize },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TaskError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownTask(_) => "UNKNOWN_TASK",
            Self::MissingFields { .. } => "MISSING_FIELDS",
            Self::InvalidPayload { .. } => "INVALID_PAYLOAD",
            Self::MissingCoefficient(_) => "MISSING_COEFFICIENT",
            Self::MissingSetting(_) => "MISSING_SETTING",
            Self::InvalidSetting { .. } => "INVALID_SETTING",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::Query(QueryError::MissingParameter(_)) => "MISSING_PARAMETER",
            Self::Query(QueryError::FieldNotPresent { .. }) => "FIELD_NOT_PRESENT",
            Self::Query(QueryError::InvalidRange(_)) => "INVALID_RANGE",
            Self::Query(QueryError::Store(e)) | Self::Store(e) => store_code(e),
        }
    }
}

fn store_code(error: &StoreError) -> &'static str {
    match error {
        StoreError::NotFound(_) => "NOT_FOUND",
        _ => "STORE_ERROR",
    }
}

impl From<EngineError> for TaskError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::MissingCoefficient(ds) => Self::MissingCoefficient(ds),
            EngineError::MissingSetting(asset_id) => Self::MissingSetting(asset_id),
            EngineError::InvalidSetting { asset_id, value } => {
                Self::InvalidSetting { asset_id, value }
            }
            EngineError::LimitExceeded { collection, limit } => {
                Self::LimitExceeded { collection, limit }
            }
            EngineError::Query(e) => Self::Query(e),
            EngineError::Store(e) => Self::Store(e),
        }
    }
}
