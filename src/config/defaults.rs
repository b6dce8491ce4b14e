//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Record Store
// ============================================================================

/// Result cap applied when a query gives no limit, or a limit of zero.
pub const DEFAULT_QUERY_LIMIT: usize = 10;

/// Provider name stamped on every bit grade record.
pub const DEFAULT_PROVIDER: &str = "osu_provider";

/// Collection holding WITS telemetry.
pub const DEFAULT_WITS_COLLECTION: &str = "wits";

/// Collection holding drill string → motor links.
pub const DEFAULT_DRILL_STRING_COLLECTION: &str = "ds_data";

/// Collection holding downhole motor coefficients.
pub const DEFAULT_DOWNHOLE_MOTOR_COLLECTION: &str = "dhm_data";

// ============================================================================
// Engine
// ============================================================================

/// Maximum WITS records fetched for one calculation window.
///
/// 86 400 = one day at 1 Hz.
pub const DEFAULT_WITS_BATCH_LIMIT: usize = 86_400;

/// Maximum drill string and motor records fetched for one calculation.
pub const DEFAULT_REFERENCE_LIMIT: usize = 10_000;

/// Decimal places kept on every emitted bit grade.
pub const BIT_GRADE_DECIMALS: i32 = 3;

// ============================================================================
// Storage
// ============================================================================

/// Directory holding `{collection}.json` record files.
pub const DEFAULT_RESOURCES_DIR: &str = "./resources";

/// Directory holding per-asset bit grade output.
pub const DEFAULT_OUTPUT_DIR: &str = "./resources/calculated_bg";

/// Sled database holding the cache and app settings.
pub const DEFAULT_STATE_DB: &str = "./data/bitgrade_state.db";

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";

/// Tasks running at once through `POST /task`. Cache and output updates are
/// not atomic, so calculations are serialized.
pub const MAX_CONCURRENT_TASKS: usize = 1;
