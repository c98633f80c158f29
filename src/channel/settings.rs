//! Protocol timing and sentinel configuration for a device channel

use crate::channel::state::SentinelSet;
use crate::core::{
    BOARD_ERROR_MESSAGES, BOARD_INIT_MESSAGES, MAX_DURATION, MAX_READABLE_LINE,
    MIN_ACT_DURATION_SECS, REPEAT_READ_DELAY_MS, REST_COMMAND, REST_DURATION_SECS,
    START_UP_WAITING_SECS,
};
use crate::hardware::{CommError, CommResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing guards and firmware sentinels used by a [`DeviceChannel`].
///
/// [`DeviceChannel`]: crate::channel::DeviceChannel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    /// Seconds to wait after opening the port for the board to boot
    pub startup_grace_secs: u64,
    /// Minimum settle time for any non-empty command (seconds)
    pub min_command_secs: u32,
    /// Spacing between receive-buffer polls while draining (milliseconds)
    pub read_poll_delay_ms: u64,
    /// Maximum lines read in one drain
    pub max_drain_lines: usize,
    /// Lines meaning the board has booted
    pub ready_sentinels: SentinelSet,
    /// Lines meaning the board rejected a command
    pub error_sentinels: SentinelSet,
    /// Neutral posture sent on shutdown
    pub rest_command: String,
    /// Settle time for the rest command (seconds)
    pub rest_duration_secs: u32,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            startup_grace_secs: START_UP_WAITING_SECS,
            min_command_secs: MIN_ACT_DURATION_SECS,
            read_poll_delay_ms: REPEAT_READ_DELAY_MS,
            max_drain_lines: MAX_READABLE_LINE,
            ready_sentinels: SentinelSet::from_lines(BOARD_INIT_MESSAGES),
            error_sentinels: SentinelSet::from_lines(BOARD_ERROR_MESSAGES),
            rest_command: REST_COMMAND.to_string(),
            rest_duration_secs: REST_DURATION_SECS,
        }
    }
}

impl ChannelSettings {
    /// Settings with a different settle-time floor
    pub fn with_min_command_secs(min_command_secs: u32) -> Self {
        Self {
            min_command_secs,
            ..Default::default()
        }
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_secs(self.startup_grace_secs)
    }

    pub fn read_poll_delay(&self) -> Duration {
        Duration::from_millis(self.read_poll_delay_ms)
    }

    pub fn validate(&self) -> CommResult<()> {
        if self.max_drain_lines == 0 {
            return Err(CommError::ConfigurationError {
                parameter: "max_drain_lines".to_string(),
                value: "0".to_string(),
            });
        }

        if self.ready_sentinels.is_empty() {
            return Err(CommError::ConfigurationError {
                parameter: "ready_sentinels".to_string(),
                value: "[]".to_string(),
            });
        }

        if self.rest_command.is_empty() {
            return Err(CommError::ConfigurationError {
                parameter: "rest_command".to_string(),
                value: "\"\"".to_string(),
            });
        }

        if self.rest_duration_secs > MAX_DURATION {
            return Err(CommError::ConfigurationError {
                parameter: "rest_duration_secs".to_string(),
                value: self.rest_duration_secs.to_string(),
            });
        }

        if self.min_command_secs > MAX_DURATION {
            return Err(CommError::ConfigurationError {
                parameter: "min_command_secs".to_string(),
                value: self.min_command_secs.to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_nyboard() {
        let settings = ChannelSettings::default();
        assert_eq!(settings.startup_grace(), Duration::from_secs(10));
        assert_eq!(settings.min_command_secs, 5);
        assert_eq!(settings.read_poll_delay(), Duration::from_millis(10));
        assert_eq!(settings.max_drain_lines, 500);
        assert!(settings.ready_sentinels.contains("DMP ready!"));
        assert!(settings.error_sentinels.contains("wrong key!"));
        assert_eq!(settings.rest_command, "d");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: ChannelSettings =
            serde_json::from_str(r#"{"min_command_secs": 1, "ready_sentinels": ["OK"]}"#).unwrap();
        assert_eq!(settings.min_command_secs, 1);
        assert!(settings.ready_sentinels.contains("OK"));
        assert!(!settings.ready_sentinels.contains("DMP ready!"));
        assert_eq!(settings.startup_grace_secs, 10);
    }

    #[test]
    fn test_invalid_settings() {
        let mut settings = ChannelSettings::default();
        settings.rest_command.clear();
        assert!(settings.validate().is_err());

        let mut settings = ChannelSettings::default();
        settings.ready_sentinels = SentinelSet::default();
        assert!(settings.validate().is_err());

        let settings = ChannelSettings::with_min_command_secs(301);
        assert!(settings.validate().is_err());
    }
}
