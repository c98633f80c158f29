//! Mock transport implementation for testing and development

use crate::hardware::{CommError, CommResult, SerialTransport};
use std::collections::VecDeque;
use std::io;

/// Scripted stand-in for a serial port.
///
/// Incoming data is queued line by line; everything written is recorded.
/// Opens and closes are counted, and each open can deliver a scripted batch
/// of lines to simulate the board announcing itself after a reboot.
#[derive(Debug, Clone)]
pub struct MockTransport {
    port_name: String,
    open: bool,
    incoming: VecDeque<Vec<u8>>,
    open_script: VecDeque<Vec<String>>,
    endless_line: Option<Vec<u8>>,
    written: Vec<Vec<u8>>,
    open_count: u32,
    close_count: u32,
    flush_count: u32,
    read_count: u32,
    failing_reads: u32,
    fail_open: bool,
    fail_write: bool,
    accept_writes: bool,
}

impl MockTransport {
    /// Create an open mock transport with an empty receive buffer
    pub fn new() -> Self {
        Self {
            port_name: "mock".to_string(),
            open: true,
            incoming: VecDeque::new(),
            open_script: VecDeque::new(),
            endless_line: None,
            written: Vec::new(),
            open_count: 0,
            close_count: 0,
            flush_count: 0,
            read_count: 0,
            failing_reads: 0,
            fail_open: false,
            fail_write: false,
            accept_writes: true,
        }
    }

    /// Create a mock transport whose port starts closed
    pub fn closed() -> Self {
        Self {
            open: false,
            ..Self::new()
        }
    }

    /// Queue a line as the board would print it (`\r\n` terminated)
    pub fn push_line(&mut self, line: &str) {
        let mut data = line.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        self.incoming.push_back(data);
    }

    /// Queue raw bytes as one read unit
    pub fn push_raw(&mut self, data: Vec<u8>) {
        self.incoming.push_back(data);
    }

    /// Lines to deliver on the next open; call repeatedly for later opens.
    /// An empty batch means that open delivers nothing.
    pub fn script_open(&mut self, lines: &[&str]) {
        self.open_script
            .push_back(lines.iter().map(|l| l.to_string()).collect());
    }

    /// Make the board print `line` forever
    pub fn stream_forever(&mut self, line: &str) {
        let mut data = line.as_bytes().to_vec();
        data.push(b'\n');
        self.endless_line = Some(data);
    }

    /// Make the next `count` line reads fail
    pub fn fail_next_reads(&mut self, count: u32) {
        self.failing_reads = count;
    }

    /// Make every open fail
    pub fn fail_open(&mut self, fail: bool) {
        self.fail_open = fail;
    }

    /// Make every write fail
    pub fn fail_write(&mut self, fail: bool) {
        self.fail_write = fail;
    }

    /// When false, writes succeed but report zero bytes accepted
    pub fn accept_writes(&mut self, accept: bool) {
        self.accept_writes = accept;
    }

    /// Everything written so far, one entry per write call
    pub fn written(&self) -> &[Vec<u8>] {
        &self.written
    }

    /// Written data decoded as text
    pub fn written_commands(&self) -> Vec<String> {
        self.written
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    pub fn queued_line_count(&self) -> usize {
        self.incoming.len()
    }

    pub fn open_count(&self) -> u32 {
        self.open_count
    }

    pub fn close_count(&self) -> u32 {
        self.close_count
    }

    pub fn flush_count(&self) -> u32 {
        self.flush_count
    }

    pub fn read_count(&self) -> u32 {
        self.read_count
    }

    fn not_open(&self) -> CommError {
        CommError::NotOpen {
            port: self.port_name.clone(),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialTransport for MockTransport {
    fn open(&mut self) -> CommResult<()> {
        if self.fail_open {
            return Err(CommError::OpenFailed {
                port: self.port_name.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "Simulated open failure"),
            });
        }

        if self.open {
            return Ok(());
        }

        self.open = true;
        self.open_count += 1;

        if let Some(batch) = self.open_script.pop_front() {
            for line in batch {
                self.push_line(&line);
            }
        }

        Ok(())
    }

    fn close(&mut self) -> CommResult<()> {
        self.open = false;
        self.close_count += 1;
        // The driver discards unread input with the handle
        self.incoming.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn bytes_waiting(&mut self) -> CommResult<usize> {
        if !self.open {
            return Err(self.not_open());
        }

        if let Some(line) = &self.endless_line {
            return Ok(line.len());
        }

        Ok(self.incoming.iter().map(Vec::len).sum())
    }

    fn read_line(&mut self) -> CommResult<Vec<u8>> {
        if !self.open {
            return Err(self.not_open());
        }

        self.read_count += 1;

        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            // The unreadable line is lost
            self.incoming.pop_front();
            return Err(CommError::ReadFailed {
                source: io::Error::new(io::ErrorKind::Other, "Simulated read failure"),
            });
        }

        if let Some(line) = &self.endless_line {
            return Ok(line.clone());
        }

        Ok(self.incoming.pop_front().unwrap_or_default())
    }

    fn write(&mut self, data: &[u8]) -> CommResult<usize> {
        if !self.open {
            return Err(self.not_open());
        }

        if self.fail_write {
            return Err(CommError::WriteFailed {
                command: String::from_utf8_lossy(data).into_owned(),
                source: io::Error::new(io::ErrorKind::BrokenPipe, "Simulated write failure"),
            });
        }

        self.written.push(data.to_vec());
        Ok(if self.accept_writes { data.len() } else { 0 })
    }

    fn flush(&mut self) -> CommResult<()> {
        if !self.open {
            return Err(self.not_open());
        }

        self.flush_count += 1;
        Ok(())
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}
