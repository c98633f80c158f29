use crate::channel::ChannelSettings;
use crate::hardware::TransportConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_FILE: &str = "settings.json";

/// Whole-application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Serial link and board protocol
    pub petoi: PetoiConfig,
    /// Periodic-action runner
    pub automate: AutomateConfig,
    /// Interactive training session
    pub training: TrainingConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Serial link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetoiConfig {
    /// Serial device, e.g. `/dev/ttyUSB0`
    pub port: Option<String>,
    /// Line parameters
    pub link: TransportConfig,
    /// Timing guards and sentinels
    pub channel: ChannelSettings,
    /// Reopen attempts while waiting for the board
    pub open_attempts: u32,
    /// Seconds between reopen attempts after the first one
    pub retry_interval_secs: u64,
}

impl Default for PetoiConfig {
    fn default() -> Self {
        Self {
            port: None,
            link: TransportConfig::default(),
            channel: ChannelSettings::default(),
            open_attempts: 3,
            retry_interval_secs: 10,
        }
    }
}

impl PetoiConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

/// Periodic-action runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomateConfig {
    /// JSON file listing the scenarios to pick from
    pub scenario_path: PathBuf,
    /// Number of scenarios performed before stopping
    pub act_times: u32,
    /// Lower bound of the idle time between scenarios (minutes, inclusive)
    pub act_interval_min: u64,
    /// Upper bound of the idle time between scenarios (minutes, exclusive)
    pub act_interval_max: u64,
}

impl Default for AutomateConfig {
    fn default() -> Self {
        Self {
            scenario_path: PathBuf::from("resources/automate.json"),
            act_times: 3,
            act_interval_min: 3,
            act_interval_max: 5,
        }
    }
}

/// Interactive training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Input lines accepted per session
    pub max_inputs: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self { max_inputs: 100 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("Invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    /// Configuration file I/O error
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON deserialization error
    #[error("Failed to parse config file '{path}': {source}")]
    SerializationError {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

fn invalid(parameter: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Main configuration manager
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    /// Current configuration
    config: AgentConfig,
    /// Configuration file path
    config_file_path: Option<PathBuf>,
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    /// Get current configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Path of the file the configuration came from, if any
    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Replace the configuration after validating it
    pub fn update_config(&mut self, config: AgentConfig) -> Result<(), ConfigError> {
        Self::validate(&config)?;
        self.config = config;
        Ok(())
    }

    /// Override the serial port, e.g. from the command line
    pub fn set_port(&mut self, port: impl Into<String>) {
        self.config.petoi.port = Some(port.into());
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path_str.clone(),
            source: e,
        })?;

        let config: AgentConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
                path: path_str.clone(),
                source: e,
            })?;

        self.update_config(config)?;
        self.config_file_path = Some(path.as_ref().to_path_buf());
        Ok(())
    }

    /// Check a configuration for values the tools cannot run with
    pub fn validate(config: &AgentConfig) -> Result<(), ConfigError> {
        let petoi = &config.petoi;

        petoi
            .link
            .validate()
            .map_err(|e| invalid("petoi.link", format!("{:?}", petoi.link), &e.to_string()))?;
        petoi
            .channel
            .validate()
            .map_err(|e| invalid("petoi.channel", "", &e.to_string()))?;

        if petoi.open_attempts == 0 {
            return Err(invalid("petoi.open_attempts", 0, "at least one attempt is required"));
        }

        if matches!(&petoi.port, Some(port) if port.trim().is_empty()) {
            return Err(invalid("petoi.port", "\"\"", "port name must not be empty"));
        }

        let automate = &config.automate;
        if automate.act_times == 0 {
            return Err(invalid("automate.act_times", 0, "at least one act is required"));
        }

        if config.training.max_inputs == 0 {
            return Err(invalid("training.max_inputs", 0, "at least one input is required"));
        }

        if config.logging.level.parse::<LevelFilter>().is_err() {
            return Err(invalid(
                "logging.level",
                &config.logging.level,
                "expected off, error, warn, info, debug or trace",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MAX_DURATION;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let manager = ConfigurationManager::new();
        let config = manager.config();

        assert_eq!(config.petoi.port, None);
        assert_eq!(config.petoi.link.baud_rate, 115_200);
        assert_eq!(config.petoi.open_attempts, 3);
        assert_eq!(config.petoi.retry_interval(), Duration::from_secs(10));
        assert_eq!(config.automate.act_times, 3);
        assert_eq!(config.automate.act_interval_min, 3);
        assert_eq!(config.automate.act_interval_max, 5);
        assert_eq!(config.training.max_inputs, 100);
        assert_eq!(config.logging.level, "info");
        assert!(ConfigurationManager::validate(config).is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config(
            r#"{
                "petoi": {
                    "port": "/dev/ttyUSB0",
                    "channel": {"min_command_secs": 1}
                },
                "automate": {"act_times": 5}
            }"#,
        );

        let manager = ConfigurationManager::from_file(file.path()).unwrap();
        let config = manager.config();
        assert_eq!(config.petoi.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.petoi.channel.min_command_secs, 1);
        assert_eq!(config.petoi.channel.startup_grace_secs, 10);
        assert_eq!(config.automate.act_times, 5);
        assert_eq!(config.automate.act_interval_max, 5);
        assert_eq!(manager.config_file_path(), Some(file.path()));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigurationManager::from_file("/nonexistent/settings.json");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }

    #[test]
    fn test_malformed_file() {
        let file = write_config("{ \"petoi\": ");
        let result = ConfigurationManager::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::SerializationError { .. })));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut manager = ConfigurationManager::new();

        let mut config = AgentConfig::default();
        config.petoi.open_attempts = 0;
        assert!(manager.update_config(config).is_err());

        let mut config = AgentConfig::default();
        config.logging.level = "loud".to_string();
        assert!(manager.update_config(config).is_err());

        let mut config = AgentConfig::default();
        config.petoi.link.baud_rate = 0;
        assert!(manager.update_config(config).is_err());

        let mut config = AgentConfig::default();
        config.petoi.channel.rest_duration_secs = MAX_DURATION + 1;
        assert!(manager.update_config(config).is_err());

        // Rejected updates leave the previous configuration in place
        assert_eq!(manager.config(), &AgentConfig::default());
    }

    #[test]
    fn test_shipped_settings() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/settings.json");
        let manager = ConfigurationManager::from_file(path).unwrap();
        assert_eq!(manager.config().petoi.channel.min_command_secs, 1);
    }

    #[test]
    fn test_port_override() {
        let mut manager = ConfigurationManager::new();
        manager.set_port("/dev/ttyS0");
        assert_eq!(manager.config().petoi.port.as_deref(), Some("/dev/ttyS0"));
    }
}
