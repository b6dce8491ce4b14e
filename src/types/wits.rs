//! WITS record types

use serde::{Deserialize, Serialize};

use super::{Activity, Document};

/// Measurement channels nested under `data` in a stored WITS document.
///
/// Every channel is optional on the wire; a record is only usable when all
/// of them are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WitsChannels {
    /// Measured depth (ft)
    #[serde(default)]
    pub md: Option<f64>,
    /// Weight on bit (lbf)
    #[serde(default)]
    pub wob: Option<f64>,
    /// Rotary RPM
    #[serde(default)]
    pub rpm: Option<f64>,
    /// Rate of penetration (ft/hr)
    #[serde(default)]
    pub rop: Option<f64>,
    /// Flow rate (gpm)
    #[serde(default)]
    pub flowrate: Option<f64>,
}

/// WITS document as it appears in the record store, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWitsRecord {
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub drill_string_id: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub data: WitsChannels,
}

impl RawWitsRecord {
    /// Parse a store document. Malformed documents yield `None`.
    pub fn from_document(doc: &Document) -> Option<Self> {
        serde_json::from_value(serde_json::Value::Object(doc.clone())).ok()
    }

    /// True when all five measurement channels are present.
    pub fn has_all_channels(&self) -> bool {
        let c = &self.data;
        c.md.is_some() && c.wob.is_some() && c.rpm.is_some() && c.rop.is_some() && c.flowrate.is_some()
    }

    /// Parsed activity, if it is one of the known names.
    pub fn activity(&self) -> Option<Activity> {
        self.activity.as_deref().and_then(Activity::parse)
    }

    /// Promote to a validated record.
    ///
    /// Returns `None` unless every channel is present, the activity is an
    /// accepted drilling activity, and the record carries a timestamp and a
    /// drill string id.
    pub fn validate(self) -> Option<WitsRecord> {
        let activity = self.activity().filter(Activity::is_accepted)?;
        let WitsChannels { md, wob, rpm, rop, flowrate } = self.data;

        Some(WitsRecord {
            timestamp: self.timestamp?,
            drill_string_id: self.drill_string_id?,
            measured_depth: md?,
            weight_on_bit: wob?,
            rpm: rpm?,
            rop: rop?,
            flowrate: flowrate?,
            activity,
        })
    }
}

/// A validated WITS record. Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct WitsRecord {
    pub timestamp: i64,
    pub drill_string_id: String,
    pub measured_depth: f64,
    pub weight_on_bit: f64,
    pub rpm: f64,
    pub rop: f64,
    pub flowrate: f64,
    pub activity: Activity,
}

impl WitsRecord {
    /// Parse and validate a store document in one step.
    pub fn from_document(doc: &Document) -> Option<Self> {
        RawWitsRecord::from_document(doc).and_then(RawWitsRecord::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!("test documents are objects"),
        }
    }

    fn drilling_doc() -> serde_json::Value {
        json!({
            "timestamp": 1677112070,
            "provider": "osu_provider",
            "drill_string_id": "ds_1",
            "activity": "rotary_drilling",
            "data": {"md": 120.5, "wob": 10.0, "rpm": 5.0, "rop": 1.0, "flowrate": 2.0}
        })
    }

    #[test]
    fn test_complete_drilling_record_is_valid() {
        let record = WitsRecord::from_document(&doc(drilling_doc())).unwrap();
        assert_eq!(record.timestamp, 1677112070);
        assert_eq!(record.drill_string_id, "ds_1");
        assert_eq!(record.weight_on_bit, 10.0);
        assert_eq!(record.activity, Activity::RotaryDrilling);
    }

    #[test]
    fn test_null_channel_is_rejected() {
        let mut value = drilling_doc();
        value["data"]["rop"] = serde_json::Value::Null;
        let raw = RawWitsRecord::from_document(&doc(value)).unwrap();
        assert!(!raw.has_all_channels());
        assert!(raw.validate().is_none());
    }

    #[test]
    fn test_missing_data_object_is_rejected() {
        let mut value = drilling_doc();
        value.as_object_mut().unwrap().remove("data");
        assert!(WitsRecord::from_document(&doc(value)).is_none());
    }

    #[test]
    fn test_non_drilling_activity_is_rejected() {
        for activity in ["tripping_in", "tripping_out", "casing", "circulating", "unknown"] {
            let mut value = drilling_doc();
            value["activity"] = json!(activity);
            assert!(WitsRecord::from_document(&doc(value)).is_none(), "{activity} accepted");
        }
    }

    #[test]
    fn test_slide_drilling_is_accepted() {
        let mut value = drilling_doc();
        value["activity"] = json!("slide_drilling");
        assert!(WitsRecord::from_document(&doc(value)).is_some());
    }

    #[test]
    fn test_zero_valued_channel_counts_as_present() {
        let mut value = drilling_doc();
        value["data"]["rpm"] = json!(0.0);
        assert!(WitsRecord::from_document(&doc(value)).is_some());
    }
}
