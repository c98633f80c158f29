//! Core data types for command sequencing

/// One step of a motion sequence: a firmware command and the seconds to
/// wait after sending it. An empty command is a pure wait.
///
/// Entries are only built by [`CommandQueue`], so `duration` is always
/// within `0..=MAX_DURATION`.
///
/// [`CommandQueue`]: crate::command::CommandQueue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    command: String,
    duration: u32,
}

impl CommandEntry {
    pub(crate) fn new(command: String, duration: u32) -> Self {
        Self { command, duration }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Settle time in seconds
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// True when the entry only waits and sends nothing
    pub fn is_wait(&self) -> bool {
        self.command.is_empty()
    }
}
