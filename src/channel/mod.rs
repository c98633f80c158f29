//! Device channel to the robot board
//!
//! Owns the serial link, tracks whether the board has booted and paces
//! every command with its settle time.

pub mod device;
pub mod settings;
pub mod state;

pub use device::DeviceChannel;
pub use settings::ChannelSettings;
pub use state::{ChannelState, SentinelSet};

use crate::core::Sleeper;
use crate::hardware::{CommResult, SerialTransport};
use std::time::Duration;
use tracing::info;

/// Make a freshly constructed channel ready for use.
///
/// If the board has not announced itself, the port is reopened up to
/// `attempts` times. Returns `None` when the board never becomes ready.
pub fn bring_up<T: SerialTransport, S: Sleeper>(
    mut channel: DeviceChannel<T, S>,
    attempts: u32,
    retry_interval: Duration,
) -> CommResult<Option<DeviceChannel<T, S>>> {
    if !channel.probe_ready() {
        info!("The board is not ready, so try opening the port again.");
        channel.ensure_ready(attempts, retry_interval)?;
    }

    if !channel.probe_ready() {
        return Ok(None);
    }

    Ok(Some(channel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RecordingSleeper;
    use crate::hardware::MockTransport;

    fn channel(transport: MockTransport) -> DeviceChannel<MockTransport, RecordingSleeper> {
        DeviceChannel::with_sleeper(transport, ChannelSettings::default(), RecordingSleeper::new())
    }

    #[test]
    fn test_bring_up_ready_board() {
        let mut transport = MockTransport::new();
        transport.push_line("DMP ready!");

        let ch = bring_up(channel(transport), 3, Duration::from_secs(10)).unwrap();
        let ch = ch.expect("board should be ready");
        assert_eq!(ch.state(), ChannelState::OpenReady);
        assert_eq!(ch.transport().open_count(), 0);
    }

    #[test]
    fn test_bring_up_after_reopen() {
        let mut transport = MockTransport::closed();
        transport.script_open(&["DMP ready!"]);

        let ch = bring_up(channel(transport), 3, Duration::from_secs(10)).unwrap();
        assert!(ch.is_some());
    }

    #[test]
    fn test_bring_up_silent_board() {
        let ch = bring_up(channel(MockTransport::new()), 3, Duration::from_secs(10)).unwrap();
        assert!(ch.is_none());
    }
}
