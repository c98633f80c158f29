//! Validated, ordered command queue
//!
//! The queue only checks the *shape* of each entry: a string command and an
//! integer settle time in `0..=MAX_DURATION`. It does not know whether the
//! firmware understands the command, so be careful not to break the robot
//! with a wrong one.

use crate::command::error::{json_kind, EntryRejection, QueueError};
use crate::core::{CommandEntry, MAX_DURATION};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Document key holding the list of records
pub const COMMAND_PACK_KEY: &str = "commandPack";

/// Anything that may be offered as a duration: trusted integers from
/// configuration, or raw text typed by a user.
pub trait DurationInput {
    /// Parse and range-check the value as whole seconds
    fn to_duration(&self) -> Result<u32, EntryRejection>;
}

fn check_range(value: i64) -> Result<u32, EntryRejection> {
    if value < 0 || value > i64::from(MAX_DURATION) {
        return Err(EntryRejection::DurationOutOfRange { value });
    }
    Ok(value as u32)
}

impl DurationInput for i64 {
    fn to_duration(&self) -> Result<u32, EntryRejection> {
        check_range(*self)
    }
}

impl DurationInput for i32 {
    fn to_duration(&self) -> Result<u32, EntryRejection> {
        check_range(i64::from(*self))
    }
}

impl DurationInput for u32 {
    fn to_duration(&self) -> Result<u32, EntryRejection> {
        check_range(i64::from(*self))
    }
}

impl DurationInput for u64 {
    fn to_duration(&self) -> Result<u32, EntryRejection> {
        check_range(i64::try_from(*self).unwrap_or(i64::MAX))
    }
}

impl DurationInput for str {
    fn to_duration(&self) -> Result<u32, EntryRejection> {
        let value = self
            .trim()
            .parse::<i64>()
            .map_err(|_| EntryRejection::DurationNotInteger {
                value: format!("{:?}", self),
            })?;
        check_range(value)
    }
}

impl DurationInput for String {
    fn to_duration(&self) -> Result<u32, EntryRejection> {
        self.as_str().to_duration()
    }
}

impl DurationInput for Value {
    fn to_duration(&self) -> Result<u32, EntryRejection> {
        match self {
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    check_range(v)
                } else if n.is_u64() {
                    Err(EntryRejection::DurationOutOfRange { value: i64::MAX })
                } else {
                    Err(EntryRejection::DurationNotInteger { value: n.to_string() })
                }
            }
            Value::String(s) => s.to_duration(),
            other => Err(EntryRejection::DurationNotInteger {
                value: other.to_string(),
            }),
        }
    }
}

impl<T: DurationInput + ?Sized> DurationInput for &T {
    fn to_duration(&self) -> Result<u32, EntryRejection> {
        (**self).to_duration()
    }
}

/// Ordered list of commands waiting to be sent; insertion order is
/// execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandQueue {
    entries: Vec<CommandEntry>,
}

impl CommandQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from entry-like records, skipping invalid ones
    pub fn from_records(records: &[Value]) -> Self {
        let mut queue = Self::new();
        queue.extend_from_records(records);
        queue
    }

    /// Build a queue from a JSON document carrying a `commandPack` array.
    ///
    /// Malformed JSON is an error. A missing or non-array `commandPack`
    /// gives an empty queue; invalid records inside it are skipped.
    pub fn from_json_str(document: &str) -> Result<Self, QueueError> {
        let parsed: Value = serde_json::from_str(document)?;

        let object = match &parsed {
            Value::Object(map) => map,
            other => {
                return Err(QueueError::NotAnObject {
                    found: json_kind(other),
                })
            }
        };

        let mut queue = Self::new();
        match object.get(COMMAND_PACK_KEY) {
            Some(Value::Array(records)) => queue.extend_from_records(records),
            Some(other) => debug!(
                "Ignoring {} which is {}, not a list.",
                COMMAND_PACK_KEY,
                json_kind(other)
            ),
            None => debug!("Document has no {}.", COMMAND_PACK_KEY),
        }

        Ok(queue)
    }

    /// Validate and append one entry. Returns false and leaves the queue
    /// untouched when either field is invalid.
    pub fn append<D: DurationInput + ?Sized>(&mut self, command: &str, duration: &D) -> bool {
        match duration.to_duration() {
            Ok(duration) => {
                self.entries.push(CommandEntry::new(command.to_string(), duration));
                true
            }
            Err(reason) => {
                debug!("Rejected cmd[{}]: {}", command, reason);
                false
            }
        }
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandEntry> {
        self.entries.iter()
    }

    fn extend_from_records(&mut self, records: &[Value]) {
        for record in records {
            match Self::parse_record(record) {
                Ok(entry) => self.entries.push(entry),
                Err(reason) => debug!("Invalid item: {}", reason),
            }
        }
    }

    /// Check one record; a missing `duration` means 0 and a missing `cmd`
    /// means a pure wait.
    fn parse_record(record: &Value) -> Result<CommandEntry, EntryRejection> {
        let fields = record.as_object().ok_or_else(|| EntryRejection::NotARecord {
            record: record.to_string(),
        })?;

        let duration = match fields.get("duration") {
            Some(value) => value.to_duration()?,
            None => 0,
        };

        let command = match fields.get("cmd") {
            Some(Value::String(cmd)) => cmd.clone(),
            Some(other) => {
                return Err(EntryRejection::CommandNotString {
                    value: other.to_string(),
                })
            }
            None => String::new(),
        };

        Ok(CommandEntry::new(command, duration))
    }
}

impl<'a> IntoIterator for &'a CommandQueue {
    type Item = &'a CommandEntry;
    type IntoIter = std::slice::Iter<'a, CommandEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "Empty");
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "cmd:{}, duration:{}", entry.command(), entry.duration())?;
        }
        Ok(())
    }
}
