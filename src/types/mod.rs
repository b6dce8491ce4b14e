//! Shared data structures for WITS-based bit grade calculation
//!
//! This module defines the record shapes that flow through the engine:
//! - Input: WitsRecord (telemetry), DrillString and DownholeMotor (reference data)
//! - Output: BitGrade (cumulative wear score, also the cache entry)
//! - Configuration: AppSetting (per-asset mutable wear constant)

mod bit_grade;
mod reference;
mod setting;
mod state;
mod wits;

pub use bit_grade::*;
pub use reference::*;
pub use setting::*;
pub use state::*;
pub use wits::*;

/// A raw record as held by a record store collection.
///
/// Collections are heterogeneous (WITS, drill strings, motors), so the query
/// layer filters and projects generic JSON objects before they are parsed
/// into typed records.
pub type Document = serde_json::Map<String, serde_json::Value>;
