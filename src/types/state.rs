//! Rig activity classification carried on every WITS record

use serde::{Deserialize, Serialize};

/// Operational activity reported alongside a WITS record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    RotaryDrilling,
    SlideDrilling,
    TrippingIn,
    TrippingOut,
    Casing,
    Circulating,
}

impl Activity {
    /// All activities, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::RotaryDrilling,
        Self::SlideDrilling,
        Self::TrippingIn,
        Self::TrippingOut,
        Self::Casing,
        Self::Circulating,
    ];

    /// Wire name as stored in the `activity` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::RotaryDrilling => "rotary_drilling",
            Activity::SlideDrilling => "slide_drilling",
            Activity::TrippingIn => "tripping_in",
            Activity::TrippingOut => "tripping_out",
            Activity::Casing => "casing",
            Activity::Circulating => "circulating",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Only on-bottom drilling wears the bit.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Activity::RotaryDrilling | Activity::SlideDrilling)
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activity::RotaryDrilling => write!(f, "Rotary Drilling"),
            Activity::SlideDrilling => write!(f, "Slide Drilling"),
            Activity::TrippingIn => write!(f, "Tripping In"),
            Activity::TrippingOut => write!(f, "Tripping Out"),
            Activity::Casing => write!(f, "Casing"),
            Activity::Circulating => write!(f, "Circulating"),
        }
    }
}
