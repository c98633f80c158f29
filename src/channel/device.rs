//! Device channel: connection, readiness and command pacing
//!
//! Every operation blocks until it is done. A command is followed by its
//! full settle time before the call returns, so a new motion can never be
//! issued while the previous one is still running.
//!
//! Both [`DeviceChannel::probe_ready`] and [`DeviceChannel::has_error_response`]
//! consume whatever is in the receive buffer. Use one of them per read
//! window; the second caller sees nothing.

use crate::channel::settings::ChannelSettings;
use crate::channel::state::ChannelState;
use crate::command::CommandQueue;
use crate::core::{CommandEntry, Sleeper, ThreadSleeper};
use crate::hardware::{CommResult, SerialPortTransport, SerialTransport, TransportConfig};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Sole owner of the link to the board
pub struct DeviceChannel<T, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    settings: ChannelSettings,
    /// Sticky once set: the firmware announces readiness only once
    board_ready: bool,
}

impl DeviceChannel<SerialPortTransport> {
    /// Open a serial port and wait for the board to boot.
    ///
    /// Failing to open the port is an error.
    pub fn connect(
        port_name: &str,
        link: TransportConfig,
        settings: ChannelSettings,
    ) -> CommResult<Self> {
        info!("Connecting to port [{}] at {} baud.", port_name, link.baud_rate);
        let transport = SerialPortTransport::open_new(port_name, link).map_err(|e| {
            error!("Fails to open port ({})", e);
            e
        })?;
        Ok(Self::new(transport, settings))
    }
}

impl<T: SerialTransport> DeviceChannel<T> {
    /// Wrap a transport, blocking for the startup grace period
    pub fn new(transport: T, settings: ChannelSettings) -> Self {
        Self::with_sleeper(transport, settings, ThreadSleeper)
    }
}

impl<T: SerialTransport, S: Sleeper> DeviceChannel<T, S> {
    /// Wrap a transport with a custom sleeper, blocking for the startup
    /// grace period. A transport that is not open is kept as is and logged;
    /// the first write reopens it.
    pub fn with_sleeper(transport: T, settings: ChannelSettings, mut sleeper: S) -> Self {
        sleeper.sleep(settings.startup_grace());

        if !transport.is_open() {
            warn!("Port [{}] is not opened.", transport.port_name());
        }

        Self {
            transport,
            sleeper,
            settings,
            board_ready: false,
        }
    }

    pub fn state(&self) -> ChannelState {
        ChannelState::from_flags(self.transport.is_open(), self.board_ready)
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Whether the ready line has ever been seen
    pub fn is_board_ready(&self) -> bool {
        self.board_ready
    }

    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn sleeper_mut(&mut self) -> &mut S {
        &mut self.sleeper
    }

    /// Block for `duration` on the channel's clock
    pub fn pause(&mut self, duration: Duration) {
        self.sleeper.sleep(duration);
    }

    /// Reopen the port until the board reports ready or `max_attempts` is
    /// reached. The first attempt waits the full startup grace, later ones
    /// wait `retry_interval`.
    ///
    /// Returns whether the port is open afterwards; check
    /// [`probe_ready`](Self::probe_ready) for readiness.
    pub fn ensure_ready(&mut self, max_attempts: u32, retry_interval: Duration) -> CommResult<bool> {
        if self.probe_ready() {
            return Ok(true);
        }

        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!("Try reopen port [{}/{}]", attempt, max_attempts);

            self.close()?;
            self.transport.open().map_err(|e| {
                error!("Fails to open port ({})", e);
                e
            })?;

            let wait = if attempt == 1 {
                self.settings.startup_grace()
            } else {
                retry_interval
            };
            self.sleeper.sleep(wait);

            if self.probe_ready() || attempt >= max_attempts {
                break;
            }
        }

        Ok(self.transport.is_open())
    }

    /// Close the port. Returns whether it is still open.
    pub fn close(&mut self) -> CommResult<bool> {
        if !self.transport.is_open() {
            debug!("Port is already closed.");
            return Ok(false);
        }

        self.transport.close()?;
        Ok(self.transport.is_open())
    }

    /// Send one command and block for its settle time.
    ///
    /// A closed port is reopened first, followed by the startup grace. A
    /// non-empty command never settles for less than the configured floor;
    /// an empty command sends nothing and only waits. Returns true when
    /// nothing had to be sent or the port accepted at least one byte.
    pub fn write_command(&mut self, command: &str, duration: u32) -> CommResult<bool> {
        if !self.transport.is_open() {
            info!("Port [{}] is closed, reopening.", self.transport.port_name());
            self.transport.open()?;
            self.sleeper.sleep(self.settings.startup_grace());
        }

        let mut duration = duration;
        if !command.is_empty() && duration < self.settings.min_command_secs {
            duration = self.settings.min_command_secs;
        }

        debug!("Act cmd[{}], duration[{}]", command, duration);

        let mut written = 0;
        if !command.is_empty() {
            written = self.transport.write(command.as_bytes()).map_err(|e| {
                error!("Fails to write command cmd[{}] duration[{}] ({})", command, duration, e);
                e
            })?;
            self.transport.flush()?;
        }

        self.sleeper.sleep(Duration::from_secs(u64::from(duration)));
        Ok(command.is_empty() || written > 0)
    }

    pub fn write_entry(&mut self, entry: &CommandEntry) -> CommResult<bool> {
        self.write_command(entry.command(), entry.duration())
    }

    /// Send every entry of `queue` in order. Returns true when every
    /// write reported success.
    pub fn transmit(&mut self, queue: &CommandQueue) -> CommResult<bool> {
        let mut all_sent = true;
        for entry in queue {
            all_sent &= self.write_entry(entry)?;
        }
        Ok(all_sent)
    }

    /// Read every buffered line without waiting for new data.
    ///
    /// Stops once the buffer is empty or after `max_drain_lines` reads.
    /// Undecodable bytes are replaced and unreadable lines are dropped.
    pub fn drain_input(&mut self) -> Vec<String> {
        let open = self.transport.is_open();
        if !open || self.pending_bytes() == 0 {
            debug!("Nothing in input buffer (port is open ? [{}])", open);
            return Vec::new();
        }

        let mut lines = Vec::new();
        let mut reads = 0;
        loop {
            self.sleeper.sleep(self.settings.read_poll_delay());
            reads += 1;
            if self.pending_bytes() == 0 || reads > self.settings.max_drain_lines {
                break;
            }

            match self.transport.read_line() {
                Ok(raw) => {
                    let line = decode_line(&raw);
                    debug!("<<< {}", line);
                    lines.push(line);
                }
                Err(e) => debug!("Dropped an unreadable line ({})", e),
            }
        }

        lines
    }

    /// Whether the board has finished booting.
    ///
    /// Once the ready line has been seen this returns true (while the port is
    /// open) without touching the buffer. Until then every call drains it.
    pub fn probe_ready(&mut self) -> bool {
        if !self.transport.is_open() {
            return false;
        }

        if self.board_ready {
            return true;
        }

        let lines = self.drain_input();
        if let Some(line) = self.settings.ready_sentinels.find_in(&lines) {
            info!("Board is ready [{}].", line);
            self.board_ready = true;
        }

        self.board_ready
    }

    /// Drain the buffer and report whether the board rejected a command
    pub fn has_error_response(&mut self) -> bool {
        let lines = self.drain_input();
        if lines.is_empty() {
            return false;
        }

        match self.settings.error_sentinels.find_in(&lines) {
            Some(line) => {
                warn!("Board responded with an error [{}].", line);
                true
            }
            None => false,
        }
    }

    /// Leave the board at rest: optionally send the rest command, drain
    /// what is left and close the port.
    pub fn shutdown(&mut self, send_rest: bool) -> CommResult<()> {
        if send_rest {
            let rest = self.settings.rest_command.clone();
            self.write_command(&rest, self.settings.rest_duration_secs)?;
        }

        self.drain_input();
        self.close()?;
        info!("Channel to [{}] shut down.", self.transport.port_name());
        Ok(())
    }

    fn pending_bytes(&mut self) -> usize {
        match self.transport.bytes_waiting() {
            Ok(n) => n,
            Err(e) => {
                debug!("Cannot query input buffer ({})", e);
                0
            }
        }
    }
}

/// Decode one received line, dropping its terminator
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(&['\r', '\n'][..])
        .to_string()
}
