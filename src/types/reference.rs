//! Drill string and downhole motor reference data

use serde::{Deserialize, Serialize};

/// Drill string assembly, linked to the motor it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillString {
    #[serde(rename = "_drill_string_id", alias = "drill_string_id")]
    pub drill_string_id: String,
    /// Strings without a motor never join to a coefficient.
    #[serde(rename = "down_hole_motor_id", default)]
    pub downhole_motor_id: Option<String>,
}

/// Downhole motor and its wear coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownholeMotor {
    pub motor_id: String,
    #[serde(rename = "motor_cof", default)]
    pub motor_coefficient: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drill_string_reads_store_field_names() {
        let ds: DrillString = serde_json::from_value(json!({
            "id": "ignored",
            "_drill_string_id": "ds_1",
            "down_hole_motor_id": "motor_id_1"
        }))
        .unwrap();
        assert_eq!(ds.drill_string_id, "ds_1");
        assert_eq!(ds.downhole_motor_id.as_deref(), Some("motor_id_1"));
    }

    #[test]
    fn test_motor_without_coefficient_parses() {
        let motor: DownholeMotor = serde_json::from_value(json!({"motor_id": "m"})).unwrap();
        assert_eq!(motor.motor_coefficient, None);
    }
}
