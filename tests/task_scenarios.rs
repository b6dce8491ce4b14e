//! Task Scenario Tests
//!
//! End-to-end task runs against the on-disk backends: JSON record files,
//! a per-asset JSON output log and a sled database for cache and settings.

use std::fs;
use std::path::Path;

use bitgrade::config::AppConfig;
use bitgrade::engine::round_to;
use bitgrade::storage::{BitGradeLog, JsonFileBitGradeLog, Stores};
use bitgrade::tasks::{TaskDispatcher, TaskError, TaskOutcome, TaskRequest};
use rand::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const ASSET: i64 = 123456789;

struct Harness {
    _dir: TempDir,
    config: AppConfig,
    dispatcher: TaskDispatcher,
}

impl Harness {
    fn new(wits: Value, drill_strings: Value, motors: Value) -> Self {
        Self::configured(wits, drill_strings, motors, |_| {})
    }

    fn configured(
        wits: Value,
        drill_strings: Value,
        motors: Value,
        adjust: impl FnOnce(&mut AppConfig),
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let resources = dir.path().join("resources");
        fs::create_dir_all(&resources).unwrap();
        write_json(&resources.join("wits.json"), &wits);
        write_json(&resources.join("ds_data.json"), &drill_strings);
        write_json(&resources.join("dhm_data.json"), &motors);

        let mut config = AppConfig::default();
        config.storage.resources_dir = resources.clone();
        config.storage.output_dir = resources.join("calculated_bg");
        config.storage.state_db = dir.path().join("state.db");
        adjust(&mut config);

        let stores = Stores::open(&config.storage).unwrap();
        let dispatcher = TaskDispatcher::from_config(stores, &config);
        Self {
            _dir: dir,
            config,
            dispatcher,
        }
    }

    fn run(&self, payload: Value) -> Result<TaskOutcome, TaskError> {
        self.dispatcher.dispatch(&payload)
    }

    fn set_wear_constant(&self, constant: f64) {
        self.run(json!({
            "task": "edit_app_setting",
            "asset_id": ASSET,
            "new_setting": {"data": {"bit_wear_constant": constant}}
        }))
        .unwrap();
    }

    fn output(&self) -> Vec<f64> {
        JsonFileBitGradeLog::new(&self.config.storage.output_dir)
            .read_all(ASSET)
            .unwrap()
            .iter()
            .map(|g| g.bit_grade())
            .collect()
    }
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn wits(ts: i64, ds: &str, wob: f64, rpm: f64, flowrate: f64, activity: &str) -> Value {
    json!({
        "timestamp": ts,
        "provider": "osu_provider",
        "drill_string_id": ds,
        "asset_id": ASSET,
        "activity": activity,
        "data": {"md": 100.0, "wob": wob, "rpm": rpm, "rop": 1.0, "flowrate": flowrate}
    })
}

fn unit_records(timestamps: &[i64], ds: &str) -> Vec<Value> {
    timestamps
        .iter()
        .map(|ts| wits(*ts, ds, 10.0, 5.0, 2.0, "rotary_drilling"))
        .collect()
}

fn single_motor() -> (Value, Value) {
    (
        json!([
            {"_drill_string_id": "A", "down_hole_motor_id": "m1"},
            {"_drill_string_id": "B", "down_hole_motor_id": "m1"}
        ]),
        json!([{"motor_id": "m1", "motor_cof": 1.0}]),
    )
}

fn calculate(start_ts: i64, end_ts: i64) -> Value {
    json!({"task": "calculate_bg", "asset_id": ASSET, "start_ts": start_ts, "end_ts": end_ts})
}

#[test]
fn two_records_without_cache() {
    let (ds, dhm) = single_motor();
    let h = Harness::new(Value::Array(unit_records(&[100, 160], "A")), ds, dhm);
    h.set_wear_constant(10.0);

    assert_eq!(h.run(calculate(0, 1000)).unwrap(), TaskOutcome::Completed);
    assert_eq!(h.output(), vec![7.0, 14.0]);

    let cache = h
        .run(json!({"task": "return_cache", "asset_id": ASSET}))
        .unwrap()
        .into_json();
    assert_eq!(cache["timestamp"], 160);
    assert_eq!(cache["provider"], "osu_provider");
    assert_eq!(cache["drillstring_id"], "A");
    assert_eq!(cache["data"]["bg"], 14.0);
}

#[test]
fn cache_for_same_drill_string_carries_over_between_calls() {
    let (ds, dhm) = single_motor();
    let h = Harness::new(Value::Array(unit_records(&[100, 160, 220, 280], "A")), ds, dhm);
    h.set_wear_constant(10.0);

    h.run(calculate(0, 200)).unwrap();
    h.run(calculate(200, 400)).unwrap();

    assert_eq!(h.output(), vec![7.0, 14.0, 21.0, 28.0]);
}

#[test]
fn cache_for_other_drill_string_is_ignored() {
    let (ds, dhm) = single_motor();
    let records = [unit_records(&[100], "B"), unit_records(&[200, 260], "A")].concat();
    let h = Harness::new(Value::Array(records), ds, dhm);
    h.set_wear_constant(10.0);

    // First call leaves B in the cache slot
    h.run(calculate(0, 150)).unwrap();
    h.run(calculate(150, 1000)).unwrap();

    assert_eq!(h.output(), vec![7.0, 7.0, 14.0]);
}

#[test]
fn batched_run_matches_single_window() {
    let (ds, dhm) = single_motor();
    let timestamps: Vec<i64> = (0..10).map(|i| 1_000 + i * 30).collect();
    let records = Value::Array(unit_records(&timestamps, "A"));

    let single = Harness::new(records.clone(), ds.clone(), dhm.clone());
    single.set_wear_constant(10.0);
    single.run(calculate(1_000, 1_300)).unwrap();

    let batched = Harness::new(records, ds, dhm);
    batched.set_wear_constant(10.0);
    let request = TaskRequest::parse(&calculate(1_000, 1_300)).unwrap();
    for window in request.into_batches(60) {
        batched.dispatcher.execute(window).unwrap();
    }

    assert_eq!(single.output(), batched.output());
    assert_eq!(batched.output().last(), Some(&70.0));
}

#[test]
fn cumulative_grade_is_rounded_prefix_sum() {
    let mut rng = StdRng::seed_from_u64(17);
    let activities = ["rotary_drilling", "slide_drilling", "circulating", "tripping_out"];

    let mut records = Vec::new();
    let mut expected_wear = Vec::new();
    for ts in 0..200 {
        // Whole numbers survive the JSON files exactly
        let (wob, rpm, flowrate) = (
            f64::from(rng.gen_range(0_u32..50_000)),
            f64::from(rng.gen_range(0_u32..350)),
            f64::from(rng.gen_range(0_u32..500)),
        );
        let activity = activities[rng.gen_range(0..activities.len())];
        if activity.ends_with("drilling") {
            expected_wear.push(wob * (rpm + flowrate * 2.5) / 1_000.0);
        }
        records.push(wits(ts, "A", wob, rpm, flowrate, activity));
    }

    let h = Harness::new(
        Value::Array(records),
        json!([{"_drill_string_id": "A", "down_hole_motor_id": "m1"}]),
        json!([{"motor_id": "m1", "motor_cof": 2.5}]),
    );
    h.set_wear_constant(1_000.0);
    h.run(calculate(0, 200)).unwrap();

    let output = h.output();
    assert_eq!(output.len(), expected_wear.len());

    let mut total = 0.0;
    for (got, wear) in output.iter().zip(&expected_wear) {
        total += wear;
        assert!((got - round_to(total, 3)).abs() < 1e-6, "{got} vs {total}");
    }
    assert!(output.windows(2).all(|w| w[1] >= w[0]), "bit grade must not decrease");
}

#[test]
fn delete_bg_collection_then_cache() {
    let (ds, dhm) = single_motor();
    let h = Harness::new(Value::Array(unit_records(&[100], "A")), ds, dhm);
    h.set_wear_constant(10.0);
    h.run(calculate(0, 1000)).unwrap();

    h.run(json!({"task": "delete_bg_collection", "asset_id": ASSET})).unwrap();
    assert!(h.output().is_empty());

    h.run(json!({"task": "delete_cache", "asset_id": ASSET})).unwrap();
    let err = h
        .run(json!({"task": "delete_cache", "asset_id": ASSET}))
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let cache = h
        .run(json!({"task": "return_cache", "asset_id": ASSET}))
        .unwrap();
    assert_eq!(cache, TaskOutcome::Value(Value::Null));
}

#[test]
fn missing_coefficient_aborts_after_earlier_runs_persist() {
    let records = [unit_records(&[100, 160], "A"), unit_records(&[220], "C")].concat();
    let (ds, dhm) = single_motor();
    let h = Harness::new(Value::Array(records), ds, dhm);
    h.set_wear_constant(10.0);

    let err = h.run(calculate(0, 1000)).unwrap_err();
    assert!(matches!(err, TaskError::MissingCoefficient(ref id) if id == "C"));

    // The run for A was written before C failed
    assert_eq!(h.output(), vec![7.0, 14.0]);
}

#[test]
fn missing_collection_file_is_not_found() {
    let (ds, dhm) = single_motor();
    let h = Harness::new(Value::Array(unit_records(&[100], "A")), ds, dhm);
    h.set_wear_constant(10.0);
    fs::remove_file(h.config.storage.resources_dir.join("dhm_data.json")).unwrap();

    let err = h.run(calculate(0, 1000)).unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn wits_without_required_field_fails_field_check() {
    let mut record = wits(100, "A", 10.0, 5.0, 2.0, "rotary_drilling");
    record.as_object_mut().unwrap().remove("provider");
    let (ds, dhm) = single_motor();
    let h = Harness::new(json!([record]), ds, dhm);
    h.set_wear_constant(10.0);

    let err = h.run(calculate(0, 1000)).unwrap_err();
    assert_eq!(err.code(), "FIELD_NOT_PRESENT");
}

#[test]
fn window_larger_than_batch_limit_is_rejected() {
    let (ds, dhm) = single_motor();
    let timestamps: Vec<i64> = (0..5).collect();
    let h = Harness::configured(
        Value::Array(unit_records(&timestamps, "A")),
        ds,
        dhm,
        |config| config.engine.wits_batch_limit = 3,
    );
    h.set_wear_constant(10.0);

    let err = h.run(calculate(0, 100)).unwrap_err();
    assert_eq!(err.code(), "LIMIT_EXCEEDED");
    assert!(h.output().is_empty());
    let cache = h
        .run(json!({"task": "return_cache", "asset_id": ASSET}))
        .unwrap();
    assert_eq!(cache, TaskOutcome::Value(Value::Null));

    // Smaller windows fit and grade every record
    let request = TaskRequest::parse(&calculate(0, 5)).unwrap();
    for window in request.into_batches(3) {
        h.dispatcher.execute(window).unwrap();
    }
    assert_eq!(h.output(), vec![7.0, 14.0, 21.0, 28.0, 35.0]);
}
