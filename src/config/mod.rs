//! Application Configuration Module
//!
//! Provides the service configuration loaded from TOML files: provider and
//! collection names, storage locations, engine limits and the HTTP bind
//! address.
//!
//! ## Loading Order
//!
//! 1. `BITGRADE_CONFIG` environment variable (path to TOML file)
//! 2. `bitgrade.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Per-asset tunables (the bit wear constant) are not part of this file;
//! they live in the settings store and are edited through tasks.

mod app_config;
pub mod defaults;
pub mod validation;

pub use app_config::*;
