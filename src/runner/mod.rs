//! Tools built on the device channel: the periodic-action runner and the
//! interactive training session

pub mod automate;
pub mod training;

pub use automate::{load_scenarios, AutomateRunner, Scenario};
pub use training::{parse_input, TrainingInput, TrainingSession};

use crate::command::QueueError;
use crate::hardware::CommError;
use crate::utils::ConfigError;

/// Errors that end a tool run
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Comm(#[from] CommError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Not found action scenario ({path}): {source}")]
    ScenarioMissing {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse action scenario ({path}): {source}")]
    ScenarioInvalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("No action scenario in {path}")]
    NoScenarios { path: String },
    #[error("No serial port configured")]
    NoPort,
    #[error("Board is not ready. Please try again!")]
    BoardNotReady,
    #[error("Console error: {0}")]
    Console(#[from] std::io::Error),
}
