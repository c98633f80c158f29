//! Configuration and logging utilities

pub mod config;
pub mod logging;

pub use config::{
    AgentConfig, AutomateConfig, ConfigError, ConfigurationManager, LoggingConfig, PetoiConfig,
    TrainingConfig, DEFAULT_CONFIG_FILE,
};
pub use logging::init_logging;
