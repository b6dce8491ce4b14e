//! Record store query contract
//!
//! `get_data` answers `(provider, collection, query)` against a `RecordStore`:
//! - field presence check (first record, or every record in strict mode)
//! - sort by `timestamp`, descending unless the query says `sort: 1`
//! - half-open time filter `ts_min <= timestamp < ts_max`
//! - field projection
//! - limit (default 10)
//!
//! This is deliberately not a general query engine: only `timestamp` is
//! sortable and filterable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::defaults::DEFAULT_QUERY_LIMIT;
use crate::storage::{RecordStore, StoreError};
use crate::types::Document;

/// Name of the only sortable / filterable field
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Query errors
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),
    #[error("fields not present in '{collection}': {}", .missing.join(", "))]
    FieldNotPresent {
        collection: String,
        missing: Vec<String>,
    },
    #[error("invalid range: ts_min and ts_max are both {0}")]
    InvalidRange(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Timestamp sort order.
///
/// On the wire this is the integer `1` (ascending) or anything else
/// (descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl From<i64> for SortDirection {
    fn from(code: i64) -> Self {
        if code == 1 {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }
}

impl From<SortDirection> for i64 {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// Query object passed alongside provider and collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Fields to keep. Empty means every field.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_max: Option<i64>,
    /// Zero or absent falls back to the default limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Check requested fields against every record instead of the first.
    #[serde(default)]
    pub strict_fields: bool,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn sort(mut self, direction: SortDirection) -> Self {
        self.sort = Some(direction);
        self
    }

    pub fn ts_min(mut self, ts: i64) -> Self {
        self.ts_min = Some(ts);
        self
    }

    pub fn ts_max(mut self, ts: i64) -> Self {
        self.ts_max = Some(ts);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn strict_fields(mut self, strict: bool) -> Self {
        self.strict_fields = strict;
        self
    }

    /// A query that constrains nothing counts as absent.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
            && self.sort.is_none()
            && self.ts_min.is_none()
            && self.ts_max.is_none()
            && self.limit.is_none()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort.unwrap_or_default()
    }

    pub fn effective_limit(&self) -> usize {
        match self.limit {
            Some(n) if n > 0 => n,
            _ => DEFAULT_QUERY_LIMIT,
        }
    }
}

/// Fetch a collection and apply the query to it.
pub fn get_data(
    store: &dyn RecordStore,
    provider: &str,
    collection: &str,
    query: Option<&RecordQuery>,
) -> Result<Vec<Document>, QueryError> {
    if provider.trim().is_empty() {
        return Err(QueryError::MissingParameter("provider"));
    }
    if collection.trim().is_empty() {
        return Err(QueryError::MissingParameter("collection"));
    }
    let query = match query {
        Some(q) if !q.is_empty() => q,
        _ => return Err(QueryError::MissingParameter("query")),
    };
    check_range(query)?;

    let records = store.fetch_collection(collection)?;
    let total = records.len();
    let result = execute(collection, records, query)?;

    debug!(
        provider,
        collection,
        backend = store.backend_name(),
        total,
        returned = result.len(),
        "Query executed"
    );
    Ok(result)
}

/// Apply a query to already-loaded records.
pub fn execute(
    collection: &str,
    mut records: Vec<Document>,
    query: &RecordQuery,
) -> Result<Vec<Document>, QueryError> {
    check_range(query)?;
    check_fields(collection, &records, query)?;

    if records.first().is_some_and(|r| r.contains_key(TIMESTAMP_FIELD)) {
        match query.sort_direction() {
            SortDirection::Ascending => records.sort_by_key(timestamp_of),
            SortDirection::Descending => {
                records.sort_by(|a, b| timestamp_of(b).cmp(&timestamp_of(a)));
            }
        }
    }

    if query.ts_min.is_some() || query.ts_max.is_some() {
        records.retain(|r| in_range(timestamp_of(r), query.ts_min, query.ts_max));
    }

    if !query.fields.is_empty() {
        for record in &mut records {
            record.retain(|key, _| query.fields.iter().any(|f| f == key));
        }
    }

    records.truncate(query.effective_limit());
    Ok(records)
}

fn check_range(query: &RecordQuery) -> Result<(), QueryError> {
    match (query.ts_min, query.ts_max) {
        (Some(min), Some(max)) if min == max => Err(QueryError::InvalidRange(min)),
        _ => Ok(()),
    }
}

fn check_fields(
    collection: &str,
    records: &[Document],
    query: &RecordQuery,
) -> Result<(), QueryError> {
    let checked: &[Document] = if query.strict_fields {
        records
    } else {
        records.get(..1).unwrap_or_default()
    };

    let mut missing: Vec<String> = query
        .fields
        .iter()
        .filter(|field| checked.iter().any(|r| !r.contains_key(field.as_str())))
        .cloned()
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    missing.dedup();
    Err(QueryError::FieldNotPresent {
        collection: collection.to_string(),
        missing,
    })
}

fn timestamp_of(record: &Document) -> Option<i64> {
    record.get(TIMESTAMP_FIELD).and_then(serde_json::Value::as_i64)
}

fn in_range(ts: Option<i64>, min: Option<i64>, max: Option<i64>) -> bool {
    let Some(ts) = ts else {
        return false;
    };
    min.map_or(true, |min| ts >= min) && max.map_or(true, |max| ts < max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    fn wits(ts: i64) -> Document {
        doc(json!({"timestamp": ts, "drill_string_id": "ds_1", "data": {"wob": 1.0}}))
    }

    fn store_with(records: Vec<Document>) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_collection("wits", records).unwrap();
        store
    }

    fn timestamps(records: &[Document]) -> Vec<i64> {
        records.iter().filter_map(timestamp_of).collect()
    }

    #[test]
    fn test_missing_provider_collection_or_query() {
        let store = store_with(vec![wits(1)]);
        let q = RecordQuery::new().limit(5);

        assert!(matches!(
            get_data(&store, "", "wits", Some(&q)),
            Err(QueryError::MissingParameter("provider"))
        ));
        assert!(matches!(
            get_data(&store, "osu_provider", " ", Some(&q)),
            Err(QueryError::MissingParameter("collection"))
        ));
        assert!(matches!(
            get_data(&store, "osu_provider", "wits", None),
            Err(QueryError::MissingParameter("query"))
        ));
        assert!(matches!(
            get_data(&store, "osu_provider", "wits", Some(&RecordQuery::new())),
            Err(QueryError::MissingParameter("query"))
        ));
    }

    #[test]
    fn test_default_sort_is_descending() {
        let records = vec![wits(2), wits(3), wits(1)];
        let out = execute("wits", records, &RecordQuery::new().limit(10)).unwrap();
        assert_eq!(timestamps(&out), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_one_is_ascending_other_codes_descending() {
        let records = vec![wits(2), wits(3), wits(1)];
        let asc = execute("wits", records.clone(), &RecordQuery::new().sort(SortDirection::from(1_i64))).unwrap();
        assert_eq!(timestamps(&asc), vec![1, 2, 3]);

        let other = execute("wits", records, &RecordQuery::new().sort(SortDirection::from(5_i64))).unwrap();
        assert_eq!(timestamps(&other), vec![3, 2, 1]);
    }

    #[test]
    fn test_time_filter_is_half_open() {
        let records = (100..=110).map(wits).collect();
        let q = RecordQuery::new().sort(SortDirection::Ascending).ts_min(102).ts_max(105);
        let out = execute("wits", records, &q).unwrap();
        assert_eq!(timestamps(&out), vec![102, 103, 104]);
    }

    #[test]
    fn test_single_bound_filters_alone() {
        let records: Vec<_> = (100..105).map(wits).collect();
        let lower = execute("wits", records.clone(), &RecordQuery::new().ts_min(103)).unwrap();
        assert_eq!(timestamps(&lower), vec![104, 103]);

        let upper = execute("wits", records, &RecordQuery::new().ts_max(102)).unwrap();
        assert_eq!(timestamps(&upper), vec![101, 100]);
    }

    #[test]
    fn test_equal_bounds_are_rejected() {
        let store = store_with(vec![wits(100)]);
        let q = RecordQuery::new().ts_min(100).ts_max(100);
        assert!(matches!(
            get_data(&store, "osu_provider", "wits", Some(&q)),
            Err(QueryError::InvalidRange(100))
        ));
    }

    #[test]
    fn test_equal_bounds_rejected_before_store_access() {
        let store = InMemoryStore::new();
        let q = RecordQuery::new().ts_min(7).ts_max(7);
        assert!(matches!(
            get_data(&store, "osu_provider", "absent", Some(&q)),
            Err(QueryError::InvalidRange(7))
        ));
    }

    #[test]
    fn test_default_limit_is_ten() {
        let records: Vec<_> = (0..25).map(wits).collect();
        let out = execute("wits", records.clone(), &RecordQuery::new().sort(SortDirection::Ascending)).unwrap();
        assert_eq!(out.len(), 10);

        let zero = execute("wits", records, &RecordQuery::new().limit(0)).unwrap();
        assert_eq!(zero.len(), 10);
    }

    #[test]
    fn test_limit_applies_after_filter_and_sort() {
        let records: Vec<_> = (0..25).map(wits).collect();
        let q = RecordQuery::new().ts_min(5).ts_max(20).limit(3);
        let out = execute("wits", records, &q).unwrap();
        assert_eq!(timestamps(&out), vec![19, 18, 17]);
    }

    #[test]
    fn test_projection_keeps_requested_fields_only() {
        let q = RecordQuery::new().fields(["timestamp", "data"]);
        let out = execute("wits", vec![wits(1)], &q).unwrap();
        let keys: Vec<_> = out[0].keys().cloned().collect();
        assert_eq!(out[0].len(), 2);
        assert!(keys.contains(&"timestamp".to_string()));
        assert!(keys.contains(&"data".to_string()));
    }

    #[test]
    fn test_missing_field_in_first_record() {
        let q = RecordQuery::new().fields(["timestamp", "rig_id", "activity"]);
        match execute("wits", vec![wits(1)], &q) {
            Err(QueryError::FieldNotPresent { collection, missing }) => {
                assert_eq!(collection, "wits");
                assert_eq!(missing, vec!["activity".to_string(), "rig_id".to_string()]);
            }
            other => panic!("expected FieldNotPresent, got {other:?}"),
        }
    }

    #[test]
    fn test_strict_mode_checks_every_record() {
        let partial = doc(json!({"timestamp": 2}));
        let records = vec![wits(1), partial];

        let lenient = RecordQuery::new().fields(["timestamp", "data"]);
        assert!(execute("wits", records.clone(), &lenient).is_ok());

        let strict = lenient.strict_fields(true);
        assert!(matches!(
            execute("wits", records, &strict),
            Err(QueryError::FieldNotPresent { .. })
        ));
    }

    #[test]
    fn test_collections_without_timestamp_keep_storage_order() {
        let records = vec![
            doc(json!({"motor_id": "m2", "motor_cof": 2.0})),
            doc(json!({"motor_id": "m1", "motor_cof": 1.0})),
        ];
        let q = RecordQuery::new().fields(["motor_id", "motor_cof"]);
        let out = execute("dhm_data", records, &q).unwrap();
        assert_eq!(out[0]["motor_id"], "m2");
        assert_eq!(out[1]["motor_id"], "m1");
    }

    #[test]
    fn test_empty_collection_skips_field_check() {
        let q = RecordQuery::new().fields(["anything"]);
        assert!(execute("wits", Vec::new(), &q).unwrap().is_empty());
    }

    #[test]
    fn test_query_deserializes_wire_shape() {
        let q: RecordQuery = serde_json::from_value(json!({
            "sort": 1,
            "fields": ["timestamp"],
            "ts_min": 10,
            "ts_max": 20
        }))
        .unwrap();
        assert_eq!(q.sort_direction(), SortDirection::Ascending);
        assert_eq!(q.effective_limit(), DEFAULT_QUERY_LIMIT);
    }
}
