//! Connection states and firmware sentinel matching

use serde::{Deserialize, Serialize};

/// Observable state of a device channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Port closed
    Closed,
    /// Port open, board has not announced itself yet
    OpenNotReady,
    /// Port open and the board's ready line has been seen
    OpenReady,
}

impl ChannelState {
    pub(crate) fn from_flags(open: bool, board_ready: bool) -> Self {
        match (open, board_ready) {
            (false, _) => ChannelState::Closed,
            (true, false) => ChannelState::OpenNotReady,
            (true, true) => ChannelState::OpenReady,
        }
    }
}

/// Set of literal lines the firmware prints to signal a state.
///
/// The board has no framing, so state is recognised by exact line match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentinelSet(Vec<String>);

impl SentinelSet {
    pub fn from_lines(lines: &[&str]) -> Self {
        Self(lines.iter().map(|l| l.to_string()).collect())
    }

    pub fn contains(&self, line: &str) -> bool {
        self.0.iter().any(|s| s == line)
    }

    /// First line of `lines` that is a sentinel
    pub fn find_in<'a>(&self, lines: &'a [String]) -> Option<&'a str> {
        lines.iter().map(String::as_str).find(|l| self.contains(l))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
