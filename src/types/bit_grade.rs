//! Bit grade output records

use serde::{Deserialize, Serialize};

/// Payload of a bit grade record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitGradeData {
    /// Cumulative bit grade, rounded to 3 decimals
    pub bg: f64,
}

/// Cumulative bit grade at one WITS timestamp.
///
/// Appended to the per-asset output log; the most recent one also serves as
/// the cache entry that seeds the next batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitGrade {
    pub timestamp: i64,
    pub provider: String,
    #[serde(rename = "drillstring_id")]
    pub drill_string_id: String,
    pub data: BitGradeData,
}

impl BitGrade {
    pub fn new(timestamp: i64, provider: &str, drill_string_id: &str, bit_grade: f64) -> Self {
        Self {
            timestamp,
            provider: provider.to_string(),
            drill_string_id: drill_string_id.to_string(),
            data: BitGradeData { bg: bit_grade },
        }
    }

    pub fn bit_grade(&self) -> f64 {
        self.data.bg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let bg = BitGrade::new(1677115017, "osu_provider", "ds_1", 3.25);
        let value = serde_json::to_value(&bg).unwrap();
        assert_eq!(
            value,
            json!({
                "timestamp": 1677115017,
                "provider": "osu_provider",
                "drillstring_id": "ds_1",
                "data": {"bg": 3.25}
            })
        );
    }
}
