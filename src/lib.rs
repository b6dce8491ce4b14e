//! Bit Grade Engine: cumulative drill bit wear from WITS telemetry
//!
//! ## Architecture
//!
//! - **Query**: filter, sort, project and limit timestamped record collections
//! - **Engine**: group drilling records by drill string and accumulate wear
//! - **Tasks**: validate task payloads and route them to the engine and stores
//! - **Storage**: record, output log, cache and settings boundaries
//! - **API**: HTTP adapter over the dispatcher

pub mod api;
pub mod config;
pub mod engine;
pub mod query;
pub mod storage;
pub mod tasks;
pub mod types;

// Re-export configuration
pub use config::AppConfig;

// Re-export commonly used types
pub use types::{Activity, AppSetting, BitGrade, DownholeMotor, DrillString, WitsRecord};

// Re-export the core
pub use engine::{BitGradeEngine, EngineError, EngineSettings};
pub use query::{get_data, QueryError, RecordQuery, SortDirection};
pub use storage::{StoreError, Stores};
pub use tasks::{TaskDispatcher, TaskError, TaskKind, TaskOutcome};
