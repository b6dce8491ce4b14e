//! JSON file backends
//!
//! Record collections live at `{root}/{collection}.json` as a JSON array of
//! objects. Bit grade output lives at `{root}/{asset_id}/bg_data.json`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{BitGradeLog, RecordStore, StoreError};
use crate::types::{BitGrade, Document};

const BIT_GRADE_FILE_NAME: &str = "bg_data.json";

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Record store reading one JSON file per collection
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }
}

impl RecordStore for JsonFileStore {
    fn fetch_collection(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Err(StoreError::NotFound(format!(
                "collection '{}' ({})",
                collection,
                path.display()
            )));
        }

        let contents = fs::read_to_string(&path).map_err(io_error(&path))?;
        let documents: Vec<Document> = serde_json::from_str(&contents)?;

        debug!(collection, count = documents.len(), "Loaded collection");
        Ok(documents)
    }

    fn backend_name(&self) -> &'static str {
        "JsonFile"
    }
}

/// Bit grade output log, one JSON array file per asset.
///
/// Appends read the whole file, concatenate and rewrite it. A crash between
/// read and write, or two writers at once, can drop records.
#[derive(Debug, Clone)]
pub struct JsonFileBitGradeLog {
    root: PathBuf,
}

impl JsonFileBitGradeLog {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Location of an asset's output file
    pub fn log_path(&self, asset_id: i64) -> PathBuf {
        self.root.join(asset_id.to_string()).join(BIT_GRADE_FILE_NAME)
    }
}

impl BitGradeLog for JsonFileBitGradeLog {
    fn append(&self, asset_id: i64, records: &[BitGrade]) -> Result<(), StoreError> {
        let path = self.log_path(asset_id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_error(dir))?;
        }

        let mut all = self.read_all(asset_id)?;
        all.extend_from_slice(records);

        let bytes = serde_json::to_vec(&all)?;
        fs::write(&path, bytes).map_err(io_error(&path))?;

        debug!(asset_id, appended = records.len(), total = all.len(), "Bit grade log rewritten");
        Ok(())
    }

    fn read_all(&self, asset_id: i64) -> Result<Vec<BitGrade>, StoreError> {
        let path = self.log_path(asset_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path).map_err(io_error(&path))?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn clear(&self, asset_id: i64) -> Result<(), StoreError> {
        let path = self.log_path(asset_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path)(e)),
        }
    }
}
