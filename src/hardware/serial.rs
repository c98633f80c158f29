//! Serial/UART transport backed by the `serialport` crate

use crate::hardware::{CommError, CommResult, SerialTransport, TransportConfig};
use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::debug;

/// Transport over a real serial device such as `/dev/ttyUSB0`
pub struct SerialPortTransport {
    port_name: String,
    config: TransportConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl std::fmt::Debug for SerialPortTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortTransport")
            .field("port_name", &self.port_name)
            .field("config", &self.config)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialPortTransport {
    /// Create a transport without touching the device
    pub fn new(port_name: impl Into<String>, config: TransportConfig) -> CommResult<Self> {
        config.validate()?;

        Ok(Self {
            port_name: port_name.into(),
            config,
            port: None,
        })
    }

    /// Create a transport and open the device immediately
    pub fn open_new(port_name: impl Into<String>, config: TransportConfig) -> CommResult<Self> {
        let mut transport = Self::new(port_name, config)?;
        transport.open()?;
        Ok(transport)
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn data_bits(&self) -> DataBits {
        match self.config.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        }
    }

    fn stop_bits(&self) -> StopBits {
        match self.config.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        }
    }

    fn port_mut(&mut self) -> CommResult<&mut Box<dyn SerialPort>> {
        let port_name = &self.port_name;
        self.port.as_mut().ok_or_else(|| CommError::NotOpen {
            port: port_name.clone(),
        })
    }
}

/// Write every byte of `data`; the driver may take only part of a buffer
/// per call and a cut-off command is a different command to the firmware.
fn write_fully<W: Write + ?Sized>(writer: &mut W, data: &[u8]) -> CommResult<usize> {
    writer.write_all(data).map_err(|e| CommError::WriteFailed {
        command: String::from_utf8_lossy(data).into_owned(),
        source: e,
    })?;
    Ok(data.len())
}

impl SerialTransport for SerialPortTransport {
    fn open(&mut self) -> CommResult<()> {
        if self.port.is_some() {
            debug!("Port [{}] is already open.", self.port_name);
            return Ok(());
        }

        let port = serialport::new(self.port_name.as_str(), self.config.baud_rate)
            .data_bits(self.data_bits())
            .parity(Parity::None)
            .stop_bits(self.stop_bits())
            .timeout(Duration::from_millis(self.config.read_timeout_ms))
            .open()
            .map_err(|e| CommError::OpenFailed {
                port: self.port_name.clone(),
                source: io::Error::from(e),
            })?;

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> CommResult<()> {
        // Dropping the handle releases the device
        self.port = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn bytes_waiting(&mut self) -> CommResult<usize> {
        let port = self.port_mut()?;
        port.bytes_to_read()
            .map(|n| n as usize)
            .map_err(|e| CommError::ReadFailed {
                source: io::Error::from(e),
            })
    }

    fn read_line(&mut self) -> CommResult<Vec<u8>> {
        let port = self.port_mut()?;
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CommError::ReadFailed { source: e }),
            }
        }

        Ok(line)
    }

    fn write(&mut self, data: &[u8]) -> CommResult<usize> {
        let port = self.port_mut()?;
        write_fully(port, data)
    }

    fn flush(&mut self) -> CommResult<()> {
        let port = self.port_mut()?;
        port.flush().map_err(|e| CommError::WriteFailed {
            command: String::new(),
            source: e,
        })
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_transport_creation() {
        let transport =
            SerialPortTransport::new("/dev/ttyUSB0", TransportConfig::default()).unwrap();
        assert_eq!(transport.port_name(), "/dev/ttyUSB0");
        assert!(!transport.is_open()); // Not opened until asked
    }

    #[test]
    fn test_io_on_closed_port() {
        let mut transport =
            SerialPortTransport::new("/dev/ttyUSB0", TransportConfig::default()).unwrap();

        assert!(matches!(transport.bytes_waiting(), Err(CommError::NotOpen { .. })));
        assert!(matches!(transport.write(b"ksit"), Err(CommError::NotOpen { .. })));
        assert!(transport.close().is_ok());
    }

    /// Driver that accepts at most `chunk` bytes per write call
    struct ChunkedWriter {
        chunk: usize,
        received: Vec<u8>,
        calls: usize,
    }

    impl Write for ChunkedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            let n = buf.len().min(self.chunk);
            self.received.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_partial_writes_send_whole_command() {
        let mut writer = ChunkedWriter { chunk: 2, received: Vec::new(), calls: 0 };

        assert_eq!(write_fully(&mut writer, b"kbalance").unwrap(), 8);
        assert_eq!(writer.received, b"kbalance");
        assert_eq!(writer.calls, 4);
    }

    #[test]
    fn test_stalled_driver_is_write_failure() {
        let mut writer = ChunkedWriter { chunk: 0, received: Vec::new(), calls: 0 };

        let result = write_fully(&mut writer, b"ksit");
        assert!(matches!(result, Err(CommError::WriteFailed { ref command, .. }) if command == "ksit"));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = TransportConfig::default();
        config.stop_bits = 3;

        let result = SerialPortTransport::new("/dev/ttyUSB0", config);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_missing_device_fails() {
        let result = SerialPortTransport::open_new(
            "/dev/petoi-serial-does-not-exist",
            TransportConfig::default(),
        );
        assert!(matches!(result, Err(CommError::OpenFailed { .. })));
    }
}
