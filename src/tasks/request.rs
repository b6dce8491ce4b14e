//! Typed task requests parsed from JSON payloads

use serde_json::{Map, Value};

use super::{TaskError, TaskKind};
use crate::types::AppSetting;

/// A payload that passed name, presence and type checks
#[derive(Debug, Clone, PartialEq)]
pub enum TaskRequest {
    CalculateBg {
        asset_id: i64,
        start_ts: i64,
        end_ts: i64,
    },
    ReturnCache { asset_id: i64 },
    DeleteCache { asset_id: i64 },
    DeleteBgCollection { asset_id: i64 },
    GetAppSetting { asset_id: i64 },
    EditAppSetting { setting: AppSetting },
}

impl TaskRequest {
    /// Validate a payload without touching any store.
    ///
    /// Order of checks: object shape, `task` presence, task name, the
    /// task's required key set, then field types.
    pub fn parse(payload: &Value) -> Result<Self, TaskError> {
        let event = payload
            .as_object()
            .ok_or_else(|| TaskError::invalid("payload", "must be a JSON object"))?;

        let name = match event.get("task") {
            None | Some(Value::Null) => return Err(TaskError::UnknownTask("null".to_string())),
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(TaskError::UnknownTask(other.to_string())),
        };
        let kind = TaskKind::parse(name).ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;

        let required = kind.required_fields();
        if !required.iter().all(|field| event.contains_key(*field)) {
            return Err(TaskError::MissingFields {
                task: kind,
                required: required.to_vec(),
            });
        }

        let asset_id = integer(event, "asset_id")?;
        let request = match kind {
            TaskKind::CalculateBg => Self::CalculateBg {
                asset_id,
                start_ts: integer(event, "start_ts")?,
                end_ts: integer(event, "end_ts")?,
            },
            TaskKind::ReturnCache => Self::ReturnCache { asset_id },
            TaskKind::DeleteCache => Self::DeleteCache { asset_id },
            TaskKind::DeleteBgCollection => Self::DeleteBgCollection { asset_id },
            TaskKind::GetAppSetting => Self::GetAppSetting { asset_id },
            TaskKind::EditAppSetting => Self::EditAppSetting {
                setting: new_setting(event, asset_id)?,
            },
        };
        Ok(request)
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            Self::CalculateBg { .. } => TaskKind::CalculateBg,
            Self::ReturnCache { .. } => TaskKind::ReturnCache,
            Self::DeleteCache { .. } => TaskKind::DeleteCache,
            Self::DeleteBgCollection { .. } => TaskKind::DeleteBgCollection,
            Self::GetAppSetting { .. } => TaskKind::GetAppSetting,
            Self::EditAppSetting { .. } => TaskKind::EditAppSetting,
        }
    }

    /// Split a `calculate_bg` window into consecutive `step`-second windows.
    ///
    /// The last window is clipped to `end_ts`. Other tasks, and a
    /// non-positive step, come back unchanged.
    pub fn into_batches(self, step: i64) -> Vec<Self> {
        match self {
            Self::CalculateBg {
                asset_id,
                start_ts,
                end_ts,
            } if step > 0 && end_ts > start_ts => {
                let mut batches = Vec::new();
                let mut window_start = start_ts;
                while window_start < end_ts {
                    let window_end = window_start.saturating_add(step).min(end_ts);
                    batches.push(Self::CalculateBg {
                        asset_id,
                        start_ts: window_start,
                        end_ts: window_end,
                    });
                    window_start = window_end;
                }
                batches
            }
            other => vec![other],
        }
    }

    pub fn asset_id(&self) -> i64 {
        match self {
            Self::CalculateBg { asset_id, .. }
            | Self::ReturnCache { asset_id }
            | Self::DeleteCache { asset_id }
            | Self::DeleteBgCollection { asset_id }
            | Self::GetAppSetting { asset_id } => *asset_id,
            Self::EditAppSetting { setting } => setting.asset_id,
        }
    }
}

fn integer(event: &Map<String, Value>, field: &str) -> Result<i64, TaskError> {
    event
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| TaskError::invalid(field, "must be an integer"))
}

/// `new_setting.data.bit_wear_constant` becomes the asset's setting.
fn new_setting(event: &Map<String, Value>, asset_id: i64) -> Result<AppSetting, TaskError> {
    const FIELD: &str = "new_setting.data.bit_wear_constant";

    let value = event
        .get("new_setting")
        .and_then(|s| s.get("data"))
        .and_then(|d| d.get("bit_wear_constant"))
        .ok_or_else(|| TaskError::invalid(FIELD, "is missing"))?;
    let constant = value
        .as_f64()
        .ok_or_else(|| TaskError::invalid(FIELD, "must be a number"))?;

    let setting = AppSetting::new(asset_id, constant);
    if !setting.is_usable() {
        return Err(TaskError::invalid(FIELD, format!("must be greater than zero, got {constant}")));
    }
    Ok(setting)
}
