//! Command queue error types

use crate::core::MAX_DURATION;

/// Failure to read a serialized command document
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The text is not valid JSON
    #[error("Failed to load json: {0}")]
    Parse(#[from] serde_json::Error),
    /// The JSON is valid but is not an object
    #[error("Command document must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },
}

/// Why a single entry was refused. Never fatal: the entry is dropped and
/// the reason logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryRejection {
    #[error("record is not an object ({record})")]
    NotARecord { record: String },
    #[error("command must be a string ({value})")]
    CommandNotString { value: String },
    #[error("Duration must be an integer value ({value})")]
    DurationNotInteger { value: String },
    #[error("Duration should be in the range 0 to {max}sec ({value})", max = MAX_DURATION)]
    DurationOutOfRange { value: i64 },
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
