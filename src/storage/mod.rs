//! Store boundaries for the bit grade engine
//!
//! The engine and dispatcher only talk to these traits:
//! - `RecordStore`: timestamped collections (WITS, drill strings, motors)
//! - `BitGradeLog`: per-asset append-only output log
//! - `CacheStore`: single-slot last bit grade per asset
//! - `SettingsStore`: per-asset app settings
//!
//! Backends:
//! - `JsonFileStore` / `JsonFileBitGradeLog`: JSON files under the resources dir
//! - `SledStateStore`: cache and settings in a sled database
//! - `InMemoryStore`: everything in memory, for tests and demos
//!
//! None of the backends make the cache read-then-overwrite or the log
//! read-then-append atomic. Two concurrent calculations against the same
//! asset can lose a cache update or interleave log appends.

mod json_store;
mod memory;
mod state;

pub use json_store::{JsonFileBitGradeLog, JsonFileStore};
pub use memory::InMemoryStore;
pub use state::SledStateStore;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::types::{AppSetting, BitGrade, Document};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Read access to raw record collections.
pub trait RecordStore: Send + Sync {
    /// Every document of a collection, in storage order.
    fn fetch_collection(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Append-only bit grade output, one log per asset.
pub trait BitGradeLog: Send + Sync {
    /// Append records after any already persisted for the asset.
    fn append(&self, asset_id: i64, records: &[BitGrade]) -> Result<(), StoreError>;

    /// All persisted records for the asset, oldest first.
    fn read_all(&self, asset_id: i64) -> Result<Vec<BitGrade>, StoreError>;

    /// Drop all persisted records for the asset.
    fn clear(&self, asset_id: i64) -> Result<(), StoreError>;
}

/// Single-slot cache holding the most recent bit grade of an asset.
pub trait CacheStore: Send + Sync {
    fn get_cache(&self, asset_id: i64) -> Result<Option<BitGrade>, StoreError>;

    /// Overwrite the slot.
    fn put_cache(&self, asset_id: i64, entry: &BitGrade) -> Result<(), StoreError>;

    /// Remove the slot. Fails with `StoreError::NotFound` if it is empty.
    fn delete_cache(&self, asset_id: i64) -> Result<(), StoreError>;
}

/// Per-asset app settings.
pub trait SettingsStore: Send + Sync {
    fn get_setting(&self, asset_id: i64) -> Result<Option<AppSetting>, StoreError>;

    /// Replace the setting for `setting.asset_id`.
    fn put_setting(&self, setting: &AppSetting) -> Result<(), StoreError>;
}

/// The set of stores one dispatcher works against.
#[derive(Clone)]
pub struct Stores {
    pub records: Arc<dyn RecordStore>,
    pub bit_grades: Arc<dyn BitGradeLog>,
    pub cache: Arc<dyn CacheStore>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Stores {
    /// Back every boundary with the same in-memory store.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            records: store.clone(),
            bit_grades: store.clone(),
            cache: store.clone(),
            settings: store,
        }
    }

    /// JSON files for records and output, sled for cache and settings.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let state = Arc::new(SledStateStore::open(&config.state_db)?);

        tracing::info!(
            resources = %config.resources_dir.display(),
            output = %config.output_dir.display(),
            state_db = %config.state_db.display(),
            "Stores opened"
        );

        Ok(Self {
            records: Arc::new(JsonFileStore::new(&config.resources_dir)),
            bit_grades: Arc::new(JsonFileBitGradeLog::new(&config.output_dir)),
            cache: state.clone(),
            settings: state,
        })
    }
}
