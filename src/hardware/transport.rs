//! Serial transport interface trait and configuration

use crate::core::DEFAULT_BAUD_RATE;
use crate::hardware::{CommError, CommResult};
use serde::{Deserialize, Serialize};

/// Byte-level access to the wire the board is attached to.
///
/// Implementations carry no protocol knowledge: commands go out as raw
/// bytes and replies come back one newline-terminated line at a time.
pub trait SerialTransport {
    /// Open the underlying port. Opening an already open port is a no-op.
    fn open(&mut self) -> CommResult<()>;

    /// Release the underlying port
    fn close(&mut self) -> CommResult<()>;

    /// Whether the port is currently open
    fn is_open(&self) -> bool;

    /// Number of received bytes waiting to be read
    fn bytes_waiting(&mut self) -> CommResult<usize>;

    /// Read up to and including the next `\n`, or whatever arrived before
    /// the read timeout
    fn read_line(&mut self) -> CommResult<Vec<u8>>;

    /// Write raw bytes, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> CommResult<usize>;

    /// Block until written bytes have left the output buffer
    fn flush(&mut self) -> CommResult<()>;

    /// Name of the port, for diagnostics
    fn port_name(&self) -> &str;
}

/// Serial line parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits per character (5 to 8)
    pub data_bits: u8,
    /// Stop bits (1 or 2)
    pub stop_bits: u8,
    /// Timeout for a single line read (milliseconds)
    pub read_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            stop_bits: 1,
            read_timeout_ms: 1000,
        }
    }
}

impl TransportConfig {
    pub fn with_baud_rate(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> CommResult<()> {
        if self.baud_rate == 0 {
            return Err(CommError::ConfigurationError {
                parameter: "baud_rate".to_string(),
                value: self.baud_rate.to_string(),
            });
        }

        if !(5..=8).contains(&self.data_bits) {
            return Err(CommError::ConfigurationError {
                parameter: "data_bits".to_string(),
                value: self.data_bits.to_string(),
            });
        }

        if !(1..=2).contains(&self.stop_bits) {
            return Err(CommError::ConfigurationError {
                parameter: "stop_bits".to_string(),
                value: self.stop_bits.to_string(),
            });
        }

        if self.read_timeout_ms == 0 {
            return Err(CommError::ConfigurationError {
                parameter: "read_timeout_ms".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}
