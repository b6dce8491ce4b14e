//! Cache and app-setting persistence in Sled DB
//!
//! Two named trees in one database:
//! - `bit_grade_cache`: last bit grade per asset
//! - `app_settings`: app setting per asset
//!
//! Keys are asset ids as big-endian bytes, values are JSON.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};
use tracing::debug;

use super::{CacheStore, SettingsStore, StoreError};
use crate::types::{AppSetting, BitGrade};

const CACHE_TREE: &str = "bit_grade_cache";
const SETTINGS_TREE: &str = "app_settings";

/// Sled-backed cache and settings store
#[derive(Clone)]
pub struct SledStateStore {
    db: Db,
    cache: Tree,
    settings: Tree,
}

impl SledStateStore {
    /// Open or create the state database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Open a throwaway database that is removed on drop
    pub fn open_temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self, StoreError> {
        let cache = db.open_tree(CACHE_TREE)?;
        let settings = db.open_tree(SETTINGS_TREE)?;
        Ok(Self { db, cache, settings })
    }

    fn read<T: DeserializeOwned>(tree: &Tree, asset_id: i64) -> Result<Option<T>, StoreError> {
        match tree.get(asset_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, tree: &Tree, asset_id: i64, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        tree.insert(asset_id.to_be_bytes(), bytes)?;
        self.db.flush()?;
        Ok(())
    }
}

impl CacheStore for SledStateStore {
    fn get_cache(&self, asset_id: i64) -> Result<Option<BitGrade>, StoreError> {
        Self::read(&self.cache, asset_id)
    }

    fn put_cache(&self, asset_id: i64, entry: &BitGrade) -> Result<(), StoreError> {
        self.write(&self.cache, asset_id, entry)?;
        debug!(asset_id, drill_string_id = %entry.drill_string_id, bg = entry.bit_grade(), "Cache overwritten");
        Ok(())
    }

    fn delete_cache(&self, asset_id: i64) -> Result<(), StoreError> {
        if self.cache.remove(asset_id.to_be_bytes())?.is_none() {
            return Err(StoreError::NotFound(format!("cache entry for asset {asset_id}")));
        }
        self.db.flush()?;
        Ok(())
    }
}

impl SettingsStore for SledStateStore {
    fn get_setting(&self, asset_id: i64) -> Result<Option<AppSetting>, StoreError> {
        Self::read(&self.settings, asset_id)
    }

    fn put_setting(&self, setting: &AppSetting) -> Result<(), StoreError> {
        self.write(&self.settings, setting.asset_id, setting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_overwrite_keeps_single_slot() {
        let store = SledStateStore::open_temporary().unwrap();
        store.put_cache(9, &BitGrade::new(1, "p", "ds_1", 1.0)).unwrap();
        store.put_cache(9, &BitGrade::new(2, "p", "ds_2", 4.0)).unwrap();

        let cached = store.get_cache(9).unwrap().unwrap();
        assert_eq!(cached.drill_string_id, "ds_2");
        assert_eq!(store.cache.len(), 1);
    }

    #[test]
    fn test_delete_missing_cache_is_not_found() {
        let store = SledStateStore::open_temporary().unwrap();
        assert!(matches!(store.delete_cache(9), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_settings_are_per_asset() {
        let store = SledStateStore::open_temporary().unwrap();
        store.put_setting(&AppSetting::new(1, 10.0)).unwrap();
        store.put_setting(&AppSetting::new(2, 20.0)).unwrap();

        assert_eq!(store.get_setting(1).unwrap().unwrap().bit_wear_constant(), 10.0);
        assert_eq!(store.get_setting(2).unwrap().unwrap().bit_wear_constant(), 20.0);
        assert!(store.get_setting(3).unwrap().is_none());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        {
            let store = SledStateStore::open(&path).unwrap();
            store.put_setting(&AppSetting::new(5, 12.5)).unwrap();
        }
        let store = SledStateStore::open(&path).unwrap();
        assert_eq!(store.get_setting(5).unwrap().unwrap().bit_wear_constant(), 12.5);
    }
}
