//! In-memory backend for every store boundary
//!
//! Thread-safe via `RwLock`. Not durable; data is lost on drop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{BitGradeLog, CacheStore, RecordStore, SettingsStore, StoreError};
use crate::types::{AppSetting, BitGrade, Document};

/// In-memory store for tests and minimal deployments
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    bit_grades: RwLock<HashMap<i64, Vec<BitGrade>>>,
    cache: RwLock<HashMap<i64, BitGrade>>,
    settings: RwLock<HashMap<i64, AppSetting>>,
    mutations: AtomicUsize,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Database(e.to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a record collection. Seeding does not count as a mutation.
    pub fn insert_collection(
        &self,
        name: &str,
        documents: Vec<Document>,
    ) -> Result<(), StoreError> {
        self.collections
            .write()
            .map_err(poisoned)?
            .insert(name.to_string(), documents);
        Ok(())
    }

    /// Number of writes made through the cache, settings and output boundaries.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

impl RecordStore for InMemoryStore {
    fn fetch_collection(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.collections
            .read()
            .map_err(poisoned)?
            .get(collection)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("collection '{collection}'")))
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

impl BitGradeLog for InMemoryStore {
    fn append(&self, asset_id: i64, records: &[BitGrade]) -> Result<(), StoreError> {
        let mut log = self.bit_grades.write().map_err(poisoned)?;
        log.entry(asset_id).or_default().extend_from_slice(records);
        self.record_mutation();
        Ok(())
    }

    fn read_all(&self, asset_id: i64) -> Result<Vec<BitGrade>, StoreError> {
        let log = self.bit_grades.read().map_err(poisoned)?;
        Ok(log.get(&asset_id).cloned().unwrap_or_default())
    }

    fn clear(&self, asset_id: i64) -> Result<(), StoreError> {
        self.bit_grades.write().map_err(poisoned)?.remove(&asset_id);
        self.record_mutation();
        Ok(())
    }
}

impl CacheStore for InMemoryStore {
    fn get_cache(&self, asset_id: i64) -> Result<Option<BitGrade>, StoreError> {
        Ok(self.cache.read().map_err(poisoned)?.get(&asset_id).cloned())
    }

    fn put_cache(&self, asset_id: i64, entry: &BitGrade) -> Result<(), StoreError> {
        self.cache
            .write()
            .map_err(poisoned)?
            .insert(asset_id, entry.clone());
        self.record_mutation();
        Ok(())
    }

    fn delete_cache(&self, asset_id: i64) -> Result<(), StoreError> {
        let removed = self.cache.write().map_err(poisoned)?.remove(&asset_id);
        match removed {
            Some(_) => {
                self.record_mutation();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("cache entry for asset {asset_id}"))),
        }
    }
}

impl SettingsStore for InMemoryStore {
    fn get_setting(&self, asset_id: i64) -> Result<Option<AppSetting>, StoreError> {
        Ok(self.settings.read().map_err(poisoned)?.get(&asset_id).cloned())
    }

    fn put_setting(&self, setting: &AppSetting) -> Result<(), StoreError> {
        self.settings
            .write()
            .map_err(poisoned)?
            .insert(setting.asset_id, setting.clone());
        self.record_mutation();
        Ok(())
    }
}
