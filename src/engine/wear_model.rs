//! Bit wear model
//!
//! Pure functions, no store access:
//! - Per-record wear contribution
//! - Cumulative wear
//! - Contiguous drill string grouping
//! - Drill string to motor coefficient join

use std::collections::HashMap;

use crate::types::{DownholeMotor, DrillString, WitsRecord};

// ============================================================================
// Wear Contribution
// ============================================================================

/// Wear contributed by a single WITS record
///
/// Formula: wear = WOB × (RPM + flowrate × motor_cof) / bit_wear_constant
///
/// The motor term converts mud flow through the downhole motor into
/// equivalent bit revolutions. The caller guarantees a usable constant.
pub fn wear_contribution(
    weight_on_bit: f64,
    rpm: f64,
    flowrate: f64,
    motor_coefficient: f64,
    bit_wear_constant: f64,
) -> f64 {
    weight_on_bit * (rpm + flowrate * motor_coefficient) / bit_wear_constant
}

/// Running sum: element `i` is the sum of `values[0..=i]`.
pub fn cumulative(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |total, v| {
            *total += v;
            Some(*total)
        })
        .collect()
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

// ============================================================================
// Grouping
// ============================================================================

/// A maximal run of consecutive records sharing one drill string
#[derive(Debug, Clone, PartialEq)]
pub struct DrillStringRun {
    pub drill_string_id: String,
    pub records: Vec<WitsRecord>,
}

/// Split timestamp-ordered records into contiguous drill string runs.
///
/// A drill string that reappears after another one starts a new run, so
/// `A, A, B, A` yields three runs. Run order follows record order.
pub fn group_contiguous(records: Vec<WitsRecord>) -> Vec<DrillStringRun> {
    let mut runs: Vec<DrillStringRun> = Vec::new();
    for record in records {
        match runs.last_mut() {
            Some(run) if run.drill_string_id == record.drill_string_id => {
                run.records.push(record);
            }
            _ => runs.push(DrillStringRun {
                drill_string_id: record.drill_string_id.clone(),
                records: vec![record],
            }),
        }
    }
    runs
}

// ============================================================================
// Coefficient Join
// ============================================================================

/// Map drill string id to the coefficient of its downhole motor.
///
/// Inner join on `DrillString.downhole_motor_id == DownholeMotor.motor_id`.
/// Drill strings without a motor and motors without a coefficient drop out.
/// Duplicate drill string ids keep the last match.
pub fn coefficient_map(
    drill_strings: &[DrillString],
    motors: &[DownholeMotor],
) -> HashMap<String, f64> {
    let by_motor: HashMap<&str, f64> = motors
        .iter()
        .filter_map(|m| m.motor_coefficient.map(|cof| (m.motor_id.as_str(), cof)))
        .collect();

    drill_strings
        .iter()
        .filter_map(|ds| {
            let motor_id = ds.downhole_motor_id.as_deref()?;
            let cof = by_motor.get(motor_id)?;
            Some((ds.drill_string_id.clone(), *cof))
        })
        .collect()
}
