//! Configuration for facetcache.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{CacheError, CacheResult};

/// Main configuration for facetcache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Rejects unknown levels and formats.
    pub fn validate(&self) -> CacheResult<()> {
        if !LOG_LEVELS.contains(&self.level.as_str()) {
            return Err(CacheError::config(format!(
                "unknown log level '{}'",
                self.level
            )));
        }
        if !LOG_FORMATS.contains(&self.format.as_str()) {
            return Err(CacheError::config(format!(
                "unknown log format '{}'",
                self.format
            )));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Derived-data cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied when `set` is called without one, in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    /// Period of the background sweep, in milliseconds.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Whether `start_sweeper` actually spawns the sweep task.
    #[serde(default = "default_true")]
    pub sweep_enabled: bool,
}

impl CacheConfig {
    /// Default TTL as a `Duration`.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Sweep period as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: default_ttl_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            sweep_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_sweep_interval_ms() -> u64 {
    60_000 // 1 minute
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CacheResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            logging: LoggingConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Tries to load configuration from current directory or uses default.
    pub fn load_or_default() -> Self {
        Self::load("facetcache.toml").unwrap_or_else(|_| Self::default_config())
    }

    /// Checks values that serde alone cannot reject.
    pub fn validate(&self) -> CacheResult<()> {
        if self.cache.sweep_interval_ms == 0 {
            return Err(CacheError::config("cache.sweep_interval_ms must be > 0"));
        }
        self.logging.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
