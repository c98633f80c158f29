//! Petoi serial link
//!
//! Drives a Petoi robot board over a serial port: builds validated command
//! queues from JSON records, waits for the board to announce itself and
//! sends every command with its settle time.

pub mod core;
pub mod hardware;
pub mod command;
pub mod channel;
pub mod runner;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{CommandEntry, Sleeper, ThreadSleeper, RecordingSleeper, MAX_DURATION};
pub use hardware::{SerialTransport, SerialPortTransport, MockTransport, TransportConfig, CommError, CommResult};
pub use command::{CommandQueue, QueueError};
pub use channel::{bring_up, DeviceChannel, ChannelSettings, ChannelState, SentinelSet};
pub use runner::{AutomateRunner, TrainingSession, RunnerError};
pub use utils::{AgentConfig, ConfigurationManager, ConfigError};
