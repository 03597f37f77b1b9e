//! Configuration for the engine's ambient services
//!
//! Consensus constants are not configurable; what lives here are the
//! operational knobs of the remote exchange and logging. Files may be
//! YAML or JSON, selected by extension.

use crate::error::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
    /// Output format: `plain` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "plain".to_string(),
        }
    }
}

/// Remote work exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Capacity of each inbound request channel
    pub channel_capacity: usize,
    /// Bound on the pending-seal table
    pub max_pending_works: usize,
    /// Seconds after which an unrefreshed hashrate report stops
    /// counting toward the aggregate
    pub rate_expiry_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            max_pending_works: 16,
            rate_expiry_secs: 600,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Remote work exchange configuration
    pub exchange: ExchangeConfig,
}

impl Config {
    /// Load a configuration file, YAML (`.yaml`/`.yml`) or JSON
    /// (`.json`) by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Config(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            Some("json") => serde_json::from_str(&contents)?,
            _ => {
                return Err(Error::Config(ConfigError::UnsupportedFormat {
                    path: path.display().to_string(),
                }))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for nonsensical values.
    pub fn validate(&self) -> Result<()> {
        if self.exchange.channel_capacity == 0 {
            return Err(Error::config("exchange.channel_capacity must be > 0"));
        }
        if self.exchange.max_pending_works == 0 {
            return Err(Error::config("exchange.max_pending_works must be > 0"));
        }
        if self.exchange.rate_expiry_secs == 0 {
            return Err(Error::config("exchange.rate_expiry_secs must be > 0"));
        }
        match self.logging.format.as_str() {
            "plain" | "json" => {}
            other => {
                return Err(Error::Config(ConfigError::InvalidValue {
                    field: "logging.format".to_string(),
                    value: other.to_string(),
                    expected: "plain or json".to_string(),
                }))
            }
        }
        Ok(())
    }
}
