//! Per-asset app settings

use serde::{Deserialize, Serialize};

/// Tunable values under the `data` key of an app setting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppSettingData {
    /// Denominator of the wear formula
    pub bit_wear_constant: f64,
}

/// Mutable configuration for one asset, read on every grade calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSetting {
    pub asset_id: i64,
    pub data: AppSettingData,
}

impl AppSetting {
    pub fn new(asset_id: i64, bit_wear_constant: f64) -> Self {
        Self {
            asset_id,
            data: AppSettingData { bit_wear_constant },
        }
    }

    pub fn bit_wear_constant(&self) -> f64 {
        self.data.bit_wear_constant
    }

    /// A usable constant is finite and strictly positive.
    pub fn is_usable(&self) -> bool {
        let c = self.data.bit_wear_constant;
        c.is_finite() && c > 0.0
    }
}
