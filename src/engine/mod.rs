//! Bit Grade Engine
//!
//! Turns a window of WITS telemetry into cumulative bit wear per drill string.
//!
//! ## Pipeline
//! 1. Fetch WITS records in `[start_ts, end_ts)`, ascending by timestamp
//! 2. Drop records that are incomplete or not in a drilling activity
//! 3. Split into contiguous drill string runs
//! 4. Join drill strings to motor coefficients
//! 5. Per run: wear, running sum, cache continuation, rounding
//! 6. Append each run to the output log and overwrite the cache slot
//!
//! Each run is persisted before the next one starts. A failure part way
//! through leaves earlier runs written.

pub mod wear_model;

pub use wear_model::{
    coefficient_map, cumulative, group_contiguous, round_to, wear_contribution, DrillStringRun,
};

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{defaults, AppConfig};
use crate::query::{self, QueryError, RecordQuery, SortDirection};
use crate::storage::{StoreError, Stores};
use crate::types::{BitGrade, Document, DownholeMotor, DrillString, WitsRecord};

/// Fields read from each WITS document
const WITS_FIELDS: [&str; 5] = ["timestamp", "provider", "drill_string_id", "data", "activity"];
const DRILL_STRING_FIELDS: [&str; 2] = ["_drill_string_id", "down_hole_motor_id"];
const MOTOR_FIELDS: [&str; 2] = ["motor_id", "motor_cof"];

/// Failures raised while calculating bit grade
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no motor coefficient for drill string '{0}'")]
    MissingCoefficient(String),

    #[error("no app setting for asset {0}")]
    MissingSetting(i64),

    #[error("app setting for asset {asset_id} has unusable bit_wear_constant {value}")]
    InvalidSetting { asset_id: i64, value: f64 },

    /// More records matched than one calculation reads. Split the window
    /// or raise the limit.
    #[error("'{collection}' has more than {limit} matching records")]
    LimitExceeded { collection: String, limit: usize },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Collection names and limits the engine reads with
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub provider: String,
    pub wits_collection: String,
    pub drill_string_collection: String,
    pub downhole_motor_collection: String,
    pub wits_batch_limit: usize,
    pub reference_limit: usize,
    pub strict_field_check: bool,
}

impl From<&AppConfig> for EngineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            provider: config.provider.name.clone(),
            wits_collection: config.collections.wits.clone(),
            drill_string_collection: config.collections.drill_strings.clone(),
            downhole_motor_collection: config.collections.downhole_motors.clone(),
            wits_batch_limit: config.engine.wits_batch_limit,
            reference_limit: config.engine.reference_limit,
            strict_field_check: config.engine.strict_field_check,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Bit grade calculator bound to a set of stores
#[derive(Clone)]
pub struct BitGradeEngine {
    stores: Stores,
    settings: EngineSettings,
}

impl BitGradeEngine {
    pub fn new(stores: Stores, settings: EngineSettings) -> Self {
        Self { stores, settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Calculate and persist bit grade for `asset_id` over `[start_ts, end_ts)`.
    ///
    /// Returns every emitted bit grade in emission order. An empty window
    /// or a window with no drilling records succeeds without side effects.
    pub fn calculate_bit_grade(
        &self,
        asset_id: i64,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<Vec<BitGrade>, EngineError> {
        info!(asset_id, start_ts, end_ts, "Calculating bit grade");

        let records = self.fetch_wits(start_ts, end_ts)?;
        if records.is_empty() {
            info!(asset_id, "No drilling records in window");
            return Ok(Vec::new());
        }

        let runs = group_contiguous(records);
        let coefficients = self.fetch_coefficients()?;

        let mut emitted = Vec::new();
        for run in &runs {
            emitted.extend(self.process_run(asset_id, run, &coefficients)?);
        }

        info!(asset_id, runs = runs.len(), emitted = emitted.len(), "Bit grade calculated");
        Ok(emitted)
    }

    fn fetch_wits(&self, start_ts: i64, end_ts: i64) -> Result<Vec<WitsRecord>, EngineError> {
        let query = RecordQuery::new()
            .fields(WITS_FIELDS)
            .sort(SortDirection::Ascending)
            .ts_min(start_ts)
            .ts_max(end_ts)
            .strict_fields(self.settings.strict_field_check);

        let documents = self.fetch_bounded(
            &self.settings.wits_collection,
            query,
            self.settings.wits_batch_limit,
        )?;

        let fetched = documents.len();
        let records: Vec<WitsRecord> = documents.iter().filter_map(WitsRecord::from_document).collect();
        debug!(fetched, kept = records.len(), "WITS records filtered");
        Ok(records)
    }

    fn fetch_coefficients(&self) -> Result<HashMap<String, f64>, EngineError> {
        let drill_strings: Vec<DrillString> =
            self.fetch_reference(&self.settings.drill_string_collection, &DRILL_STRING_FIELDS)?;
        let motors: Vec<DownholeMotor> =
            self.fetch_reference(&self.settings.downhole_motor_collection, &MOTOR_FIELDS)?;
        Ok(coefficient_map(&drill_strings, &motors))
    }

    fn fetch_reference<T: DeserializeOwned>(
        &self,
        collection: &str,
        fields: &[&str],
    ) -> Result<Vec<T>, EngineError> {
        let query = RecordQuery::new()
            .fields(fields.iter().copied())
            .strict_fields(self.settings.strict_field_check);

        self.fetch_bounded(collection, query, self.settings.reference_limit)?
            .into_iter()
            .map(|doc| parse_document(collection, doc))
            .collect()
    }

    /// Run `query` reading at most `limit` records, failing rather than
    /// truncating when more match.
    fn fetch_bounded(
        &self,
        collection: &str,
        query: RecordQuery,
        limit: usize,
    ) -> Result<Vec<Document>, EngineError> {
        let query = query.limit(limit.saturating_add(1));
        let documents = query::get_data(
            self.stores.records.as_ref(),
            &self.settings.provider,
            collection,
            Some(&query),
        )?;

        if documents.len() > limit {
            warn!(collection, limit, "Too many matching records for one calculation");
            return Err(EngineError::LimitExceeded {
                collection: collection.to_string(),
                limit,
            });
        }
        Ok(documents)
    }

    fn process_run(
        &self,
        asset_id: i64,
        run: &DrillStringRun,
        coefficients: &HashMap<String, f64>,
    ) -> Result<Vec<BitGrade>, EngineError> {
        let motor_coefficient = *coefficients
            .get(&run.drill_string_id)
            .ok_or_else(|| EngineError::MissingCoefficient(run.drill_string_id.clone()))?;

        let setting = self
            .stores
            .settings
            .get_setting(asset_id)?
            .ok_or(EngineError::MissingSetting(asset_id))?;
        if !setting.is_usable() {
            return Err(EngineError::InvalidSetting {
                asset_id,
                value: setting.bit_wear_constant(),
            });
        }
        let bit_wear_constant = setting.bit_wear_constant();

        let wear: Vec<f64> = run
            .records
            .iter()
            .map(|r| {
                wear_contribution(
                    r.weight_on_bit,
                    r.rpm,
                    r.flowrate,
                    motor_coefficient,
                    bit_wear_constant,
                )
            })
            .collect();

        // The cache continues a run only for the drill string it was written by
        let offset = match self.stores.cache.get_cache(asset_id)? {
            Some(cached) if cached.drill_string_id == run.drill_string_id => cached.bit_grade(),
            _ => 0.0,
        };

        let grades: Vec<BitGrade> = run
            .records
            .iter()
            .zip(cumulative(&wear))
            .map(|(record, total)| {
                BitGrade::new(
                    record.timestamp,
                    &self.settings.provider,
                    &run.drill_string_id,
                    round_to(total + offset, defaults::BIT_GRADE_DECIMALS),
                )
            })
            .collect();

        if let Some(last) = grades.last() {
            self.stores.bit_grades.append(asset_id, &grades)?;
            self.stores.cache.put_cache(asset_id, last)?;
        }

        debug!(
            asset_id,
            drill_string_id = %run.drill_string_id,
            records = grades.len(),
            offset,
            last_bg = grades.last().map(BitGrade::bit_grade),
            "Run persisted"
        );
        Ok(grades)
    }
}

fn parse_document<T: DeserializeOwned>(collection: &str, doc: Document) -> Result<T, EngineError> {
    serde_json::from_value(serde_json::Value::Object(doc))
        .map_err(|e| EngineError::Store(StoreError::Serialization(format!("{collection}: {e}"))))
}
