//! Service configuration as operator-tunable TOML values
//!
//! Each struct implements `Default` with the values in `defaults`, so a
//! missing file or a missing section behaves exactly like the built-in setup.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "BITGRADE_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "bitgrade.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$BITGRADE_CONFIG` env var
/// 2. `./bitgrade.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Data provider identification
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Record store collection names
    #[serde(default)]
    pub collections: CollectionsConfig,

    /// Storage locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Bit grade engine tuning
    #[serde(default)]
    pub engine: EngineConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order:
    /// 1. `$BITGRADE_CONFIG` environment variable
    /// 2. `./bitgrade.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./bitgrade.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::from_toml_str(&contents)
            .map_err(|e| match e {
                ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
                other => other,
            })?;
        Ok(config)
    }

    /// Parse and validate TOML text. Unknown keys are logged, never fatal.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Validate all values, collecting every violation.
    ///
    /// Rules:
    /// - Provider and collection names must be non-empty
    /// - The WITS batch and reference limits must be > 0
    /// - The server address must parse as `host:port`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        Self::check_name("provider.name", &self.provider.name, &mut errors);
        Self::check_name("collections.wits", &self.collections.wits, &mut errors);
        Self::check_name("collections.drill_strings", &self.collections.drill_strings, &mut errors);
        Self::check_name("collections.downhole_motors", &self.collections.downhole_motors, &mut errors);

        if self.engine.wits_batch_limit == 0 {
            errors.push("engine.wits_batch_limit must be > 0".to_string());
        }
        if self.engine.reference_limit == 0 {
            errors.push("engine.reference_limit must be > 0".to_string());
        }

        if self.server.addr.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr '{}' is not a valid host:port address",
                self.server.addr
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_name(field: &str, value: &str, errors: &mut Vec<String>) {
        if value.trim().is_empty() {
            errors.push(format!("{field} must not be empty"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Sections
// ============================================================================

/// Data provider identification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider queried for input and stamped on output records
    #[serde(default = "default_provider")]
    pub name: String,
}

fn default_provider() -> String {
    defaults::DEFAULT_PROVIDER.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider(),
        }
    }
}

/// Record store collection names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionsConfig {
    #[serde(default = "default_wits_collection")]
    pub wits: String,
    #[serde(default = "default_drill_string_collection")]
    pub drill_strings: String,
    #[serde(default = "default_downhole_motor_collection")]
    pub downhole_motors: String,
}

fn default_wits_collection() -> String {
    defaults::DEFAULT_WITS_COLLECTION.to_string()
}

fn default_drill_string_collection() -> String {
    defaults::DEFAULT_DRILL_STRING_COLLECTION.to_string()
}

fn default_downhole_motor_collection() -> String {
    defaults::DEFAULT_DOWNHOLE_MOTOR_COLLECTION.to_string()
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            wits: default_wits_collection(),
            drill_strings: default_drill_string_collection(),
            downhole_motors: default_downhole_motor_collection(),
        }
    }
}

/// Storage locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of `{collection}.json` record files
    #[serde(default = "default_resources_dir")]
    pub resources_dir: PathBuf,
    /// Directory of per-asset bit grade output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Sled database for cache and app settings
    #[serde(default = "default_state_db")]
    pub state_db: PathBuf,
}

fn default_resources_dir() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_RESOURCES_DIR)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_OUTPUT_DIR)
}

fn default_state_db() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_STATE_DB)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            resources_dir: default_resources_dir(),
            output_dir: default_output_dir(),
            state_db: default_state_db(),
        }
    }
}

/// Bit grade engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum WITS records fetched per calculation window
    #[serde(default = "default_wits_batch_limit")]
    pub wits_batch_limit: usize,
    /// Maximum drill string / motor reference records fetched per calculation
    #[serde(default = "default_reference_limit")]
    pub reference_limit: usize,
    /// Check requested fields against every record, not just the first
    #[serde(default)]
    pub strict_field_check: bool,
}

fn default_wits_batch_limit() -> usize {
    defaults::DEFAULT_WITS_BATCH_LIMIT
}

fn default_reference_limit() -> usize {
    defaults::DEFAULT_REFERENCE_LIMIT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wits_batch_limit: default_wits_batch_limit(),
            reference_limit: default_reference_limit(),
            strict_field_check: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `BITGRADE_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::DEFAULT_SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
