//! Configuration management for airtrack.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "airtrack";

/// Default dataset file name.
const DATASET_FILE_NAME: &str = "air_tracker.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AIRTRACK_`, sections
///    separated by `__`, e.g. `AIRTRACK_QUERY__SCAN_BUDGET`)
/// 2. TOML config file at `~/.config/airtrack/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset configuration.
    pub dataset: DatasetConfig,
    /// Query engine configuration.
    pub query: QueryConfig,
}

/// Dataset-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to the dataset file.
    /// Defaults to `~/.local/share/airtrack/air_tracker.db`
    pub path: Option<PathBuf>,
}

/// Query-engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Maximum number of flight records a single query may examine.
    /// Set to 0 for unlimited.
    pub scan_budget: usize,
    /// Default row limit for ranked queries.
    pub default_limit: usize,
    /// Default strict lower bound for the busy-aircraft query.
    pub busy_flight_threshold: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            scan_budget: 0,
            default_limit: 10,
            busy_flight_threshold: 5,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `AIRTRACK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        // Top-level TOML tables map to config sections, not profiles.
        // Env vars use a double underscore between section and field
        // (e.g. `AIRTRACK_QUERY__SCAN_BUDGET`) since field names
        // themselves contain underscores.
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("AIRTRACK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.query.default_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "default_limit must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Get the dataset path, resolving defaults if not set.
    #[must_use]
    pub fn dataset_path(&self) -> PathBuf {
        self.dataset
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATASET_FILE_NAME))
    }
}
