//! Configuration management for the price bridge
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{EntsoeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "ENTSOE_CONFIG";

/// Environment variable overriding `entsoe.api_key`
pub const API_KEY_ENV: &str = "ENTSOE_API_KEY";

const DEFAULT_PATHS: [&str; 3] = [
    "entsoe_config.yaml",
    "/data/entsoe_config.yaml",
    "/etc/entsoe/config.yaml",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct Config {
    /// Upstream connection and area selection
    pub entsoe: EntsoeConfig,

    /// Refresh cadence and window policy
    pub coordinator: CoordinatorConfig,

    /// Sensor self-refresh settings
    pub sensors: SensorsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,

    /// Restored-state storage
    pub persistence: PersistenceConfig,
}

/// Transparency Platform access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct EntsoeConfig {
    /// Security token issued by the Transparency Platform
    pub api_key: String,

    /// Bidding zone key (e.g. NL, DE, DK_1)
    pub area: String,

    /// Optional name used to qualify entity ids
    pub name: Option<String>,

    /// REST endpoint
    pub api_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Which span of hours a refresh requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
pub enum WindowStrategy {
    /// Start of today up to the start of the day after tomorrow
    #[serde(rename = "today_tomorrow")]
    TodayTomorrow,
    /// Midnight yesterday plus 71 hours
    #[serde(rename = "trailing_72h")]
    Trailing72h,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Minutes between scheduled refreshes
    pub update_interval_minutes: u64,

    /// Request window strategy
    pub window: WindowStrategy,

    /// Entries required before tomorrow's prices are published
    pub min_tomorrow_hours: usize,

    /// Shift tomorrow into today while serving cached data past midnight
    pub rollover: bool,
}

impl CoordinatorConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct SensorsConfig {
    /// Sensor refresh period in minutes; must divide an hour evenly
    pub refresh_interval_minutes: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file (its directory receives the rolling files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct PersistenceConfig {
    /// JSON file holding restored sensor states
    pub state_file: String,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first existing default location, then
    /// apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(&path)?,
            _ => DEFAULT_PATHS
                .iter()
                .find(|p| Path::new(p).exists())
                .map(Self::from_file)
                .transpose()?
                .unwrap_or_default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `ENTSOE_API_KEY` when set and non-empty
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            self.entsoe.api_key = key.trim().to_string();
        }
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Copy safe to expose over the API
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.entsoe.api_key.is_empty() {
            copy.entsoe.api_key = "***".to_string();
        }
        copy
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if crate::areas::lookup(&self.entsoe.area).is_none() {
            return Err(EntsoeError::validation(
                "entsoe.area".to_string(),
                format!("Unknown area: {}", self.entsoe.area),
            ));
        }

        if self.entsoe.api_key.trim().is_empty() {
            return Err(EntsoeError::validation(
                "entsoe.api_key",
                "API key cannot be empty",
            ));
        }

        if self.entsoe.api_url.trim().is_empty() {
            return Err(EntsoeError::validation(
                "entsoe.api_url",
                "API URL cannot be empty",
            ));
        }

        if self.entsoe.request_timeout_secs == 0 {
            return Err(EntsoeError::validation(
                "entsoe.request_timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.coordinator.update_interval_minutes == 0 {
            return Err(EntsoeError::validation(
                "coordinator.update_interval_minutes",
                "Must be greater than 0",
            ));
        }

        if self.coordinator.min_tomorrow_hours > 25 {
            return Err(EntsoeError::validation(
                "coordinator.min_tomorrow_hours",
                "A day has at most 25 hours",
            ));
        }

        let period = self.sensors.refresh_interval_minutes;
        if period == 0 || 60 % period != 0 {
            return Err(EntsoeError::validation(
                "sensors.refresh_interval_minutes",
                "Must be a divisor of 60",
            ));
        }

        if self.web.port == 0 {
            return Err(EntsoeError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut config = Config::default();
        config.entsoe.api_key = "token".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.entsoe.area, "NL");
        assert_eq!(config.coordinator.update_interval_minutes, 60);
        assert_eq!(config.coordinator.window, WindowStrategy::TodayTomorrow);
        assert_eq!(config.coordinator.min_tomorrow_hours, 23);
        assert_eq!(config.sensors.refresh_interval_minutes, 60);
        assert_eq!(
            config.coordinator.update_interval(),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn test_validation() {
        assert!(valid().validate().is_ok());

        // Default has no API key
        assert!(Config::default().validate().is_err());

        let mut config = valid();
        config.entsoe.area = "ATLANTIS".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.sensors.refresh_interval_minutes = 7;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.sensors.refresh_interval_minutes = 15;
        assert!(config.validate().is_ok());

        let mut config = valid();
        config.coordinator.min_tomorrow_hours = 26;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.coordinator.update_interval_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_names() {
        let yaml = "coordinator:\n  window: trailing_72h\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.coordinator.window, WindowStrategy::Trailing72h);
        // Unspecified sections fall back to defaults
        assert_eq!(config.web.port, 8088);
    }

    #[test]
    fn test_redacted_hides_key() {
        let config = valid().redacted();
        assert_eq!(config.entsoe.api_key, "***");
        assert_eq!(Config::default().redacted().entsoe.api_key, "");
    }
}
