//! Routes parsed task requests to the engine and the stores

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{TaskError, TaskOutcome, TaskRequest};
use crate::config::AppConfig;
use crate::engine::{BitGradeEngine, EngineSettings};
use crate::storage::{StoreError, Stores};
use crate::types::{AppSetting, BitGrade};

/// Synchronous task dispatcher. One call runs one task to completion.
#[derive(Clone)]
pub struct TaskDispatcher {
    stores: Stores,
    engine: BitGradeEngine,
}

impl TaskDispatcher {
    pub fn new(stores: Stores, settings: EngineSettings) -> Self {
        let engine = BitGradeEngine::new(stores.clone(), settings);
        Self { stores, engine }
    }

    pub fn from_config(stores: Stores, config: &AppConfig) -> Self {
        Self::new(stores, EngineSettings::from(config))
    }

    pub fn engine(&self) -> &BitGradeEngine {
        &self.engine
    }

    /// Validate and run one task payload.
    pub fn dispatch(&self, payload: &Value) -> Result<TaskOutcome, TaskError> {
        let request = match TaskRequest::parse(payload) {
            Ok(r) => r,
            Err(e) => {
                warn!(code = e.code(), error = %e, "Task rejected");
                return Err(e);
            }
        };
        self.execute(request)
    }

    /// Run an already validated request.
    pub fn execute(&self, request: TaskRequest) -> Result<TaskOutcome, TaskError> {
        let task = request.kind();
        let asset_id = request.asset_id();
        info!(%task, asset_id, "Running task");

        let outcome = match request {
            TaskRequest::CalculateBg {
                asset_id,
                start_ts,
                end_ts,
            } => {
                self.engine.calculate_bit_grade(asset_id, start_ts, end_ts)?;
                TaskOutcome::Completed
            }
            TaskRequest::ReturnCache { asset_id } => TaskOutcome::Value(self.return_cache(asset_id)?),
            TaskRequest::DeleteCache { asset_id } => {
                self.stores.cache.delete_cache(asset_id)?;
                TaskOutcome::Completed
            }
            TaskRequest::DeleteBgCollection { asset_id } => {
                self.stores.bit_grades.clear(asset_id)?;
                TaskOutcome::Completed
            }
            TaskRequest::GetAppSetting { asset_id } => {
                TaskOutcome::Value(self.get_app_setting(asset_id)?)
            }
            TaskRequest::EditAppSetting { setting } => {
                self.stores.settings.put_setting(&setting)?;
                TaskOutcome::Completed
            }
        };

        info!(%task, asset_id, "Task completed");
        Ok(outcome)
    }

    fn return_cache(&self, asset_id: i64) -> Result<Value, TaskError> {
        let cached: Option<BitGrade> = self.stores.cache.get_cache(asset_id)?;
        if cached.is_none() {
            debug!(asset_id, "Cache empty");
        }
        serde_json::to_value(cached).map_err(|e| TaskError::Store(StoreError::from(e)))
    }

    fn get_app_setting(&self, asset_id: i64) -> Result<Value, TaskError> {
        let setting: Option<AppSetting> = self.stores.settings.get_setting(asset_id)?;
        serde_json::to_value(setting).map_err(|e| TaskError::Store(StoreError::from(e)))
    }
}
