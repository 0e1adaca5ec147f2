//! Mock serial port implementation for testing.
//!
//! Simulates a connected device without hardware: bytes pushed into the
//! receive queue by the test harness come back out of `read_bytes` in order,
//! writes are logged for inspection, and native failures can be injected per
//! operation. The mock obeys the same contract as the native backends,
//! including "empty read is a zero-byte success" and the invalid-handle
//! behavior after close.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use super::config::LineConfig;
use super::error::PortError;
use super::traits::SerialPortAdapter;

#[derive(Debug)]
struct MockPortState {
    read_queue: VecDeque<u8>,
    write_log: Vec<Vec<u8>>,
    config: LineConfig,
    open: bool,
    /// Maximum bytes accepted by the next write, to simulate a short write.
    write_limit: Option<usize>,
    fail_next_read: bool,
    fail_next_write: bool,
    fail_close: bool,
}

/// In-memory stand-in for a serial device.
///
/// Cloning shares the underlying state, so a test can hand one clone to the
/// code under test and keep another for enqueuing data and inspecting writes.
///
/// # Example
/// ```
/// use serial_commander::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"Red LED on\n");
///
/// let mut buffer = [0u8; 64];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Red LED on\n");
///
/// port.write_bytes(b"1").unwrap();
/// assert_eq!(port.write_log(), vec![b"1".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create an open mock port with the default 9600-8N1 configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, LineConfig::default())
    }

    /// Create an open mock port with an explicit configuration.
    ///
    /// The stored configuration applies the same baud fallback the native
    /// backends do, so `line_config()` reports what a real device would.
    pub fn with_config(name: impl Into<String>, config: LineConfig) -> Self {
        let effective = LineConfig {
            baud_rate: config.effective_baud(),
            ..config
        };
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                read_queue: VecDeque::new(),
                write_log: Vec::new(),
                config: effective,
                open: true,
                write_limit: None,
                fail_next_read: false,
                fail_next_write: false,
                fail_close: false,
            })),
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations, as if the
    /// device had sent them.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.read_queue.extend(data);
    }

    /// Get a copy of every write issued to the port, in order.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.write_log.clone()
    }

    /// Number of bytes currently waiting in the receive queue.
    pub fn available_bytes(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.read_queue.len()
    }

    /// Accept at most `limit` bytes on the next write, simulating a short
    /// write from a busy driver.
    pub fn limit_next_write(&mut self, limit: usize) {
        let mut state = self.state.lock().unwrap();
        state.write_limit = Some(limit);
    }

    /// Fail the next read with `ReadFailed`.
    pub fn fail_next_read(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.fail_next_read = true;
    }

    /// Fail the next write with `WriteFailed`.
    pub fn fail_next_write(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.fail_next_write = true;
    }

    /// Make `close()` report `CloseFailed` (the handle is still invalidated).
    pub fn fail_close(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.fail_close = true;
    }

    fn injected_error(kind: io::ErrorKind) -> io::Error {
        io::Error::new(kind, "injected device failure")
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock().unwrap();
        if !state.open {
            return Err(PortError::InvalidHandle);
        }
        if data.is_empty() {
            return Ok(0);
        }
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(PortError::WriteFailed {
                source: Self::injected_error(io::ErrorKind::BrokenPipe),
            });
        }
        let accepted = match state.write_limit.take() {
            Some(limit) => data.len().min(limit),
            None => data.len(),
        };
        state.write_log.push(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock().unwrap();
        if !state.open {
            return Err(PortError::InvalidHandle);
        }
        if buffer.is_empty() {
            return Ok(0);
        }
        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(PortError::ReadFailed {
                source: Self::injected_error(io::ErrorKind::BrokenPipe),
            });
        }
        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }
        // An empty queue is "nothing available yet", a normal outcome on a
        // non-blocking port.
        Ok(bytes_read)
    }

    fn line_config(&self) -> Result<LineConfig, PortError> {
        let state = self.state.lock().unwrap();
        if !state.open {
            return Err(PortError::InvalidHandle);
        }
        Ok(state.config)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.open
    }

    fn close(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        if !state.open {
            return Err(PortError::InvalidHandle);
        }
        state.open = false;
        if state.fail_close {
            state.fail_close = false;
            return Err(PortError::CloseFailed {
                source: Self::injected_error(io::ErrorKind::Other),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn test_empty_read_is_zero_byte_success() {
        let mut port = MockSerialPort::new("MOCK0");
        let mut buffer = [0u8; 10];
        assert_eq!(port.read_bytes(&mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_partial_read_leaves_remainder_queued() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello, World!");

        let mut buffer = [0u8; 5];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
        assert_eq!(port.available_bytes(), 8);
    }

    #[test]
    fn test_write_logging() {
        let mut port = MockSerialPort::new("MOCK0");
        port.write_bytes(b"1").unwrap();
        port.write_bytes(b"4").unwrap();

        let log = port.write_log();
        assert_eq!(log, vec![b"1".to_vec(), b"4".to_vec()]);
    }

    #[test]
    fn test_short_write_is_reported_verbatim() {
        let mut port = MockSerialPort::new("MOCK0");
        port.limit_next_write(2);
        let n = port.write_bytes(b"hello").unwrap();
        assert_eq!(n, 2);
        assert_eq!(port.write_log(), vec![b"he".to_vec()]);
    }

    #[test]
    fn test_injected_read_failure() {
        let mut port = MockSerialPort::new("MOCK0");
        port.fail_next_read();

        let mut buffer = [0u8; 10];
        assert!(matches!(
            port.read_bytes(&mut buffer),
            Err(PortError::ReadFailed { .. })
        ));

        // One-shot: the next read succeeds again.
        assert_eq!(port.read_bytes(&mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_operations_after_close_are_invalid_handle() {
        let mut port = MockSerialPort::new("MOCK0");
        port.close().unwrap();

        let mut buffer = [0u8; 4];
        assert!(matches!(port.read_bytes(&mut buffer), Err(PortError::InvalidHandle)));
        assert!(matches!(port.write_bytes(b"1"), Err(PortError::InvalidHandle)));
        assert!(matches!(port.line_config(), Err(PortError::InvalidHandle)));
        assert!(matches!(port.close(), Err(PortError::InvalidHandle)));
    }

    #[test]
    fn test_failed_close_still_invalidates_handle() {
        let mut port = MockSerialPort::new("MOCK0");
        port.fail_close();

        assert!(matches!(port.close(), Err(PortError::CloseFailed { .. })));
        assert!(!port.is_open());
        assert!(matches!(port.close(), Err(PortError::InvalidHandle)));
    }

    #[test]
    fn test_stored_config_applies_baud_fallback() {
        let config = LineConfig {
            baud_rate: 12_345,
            ..Default::default()
        };
        let port = MockSerialPort::with_config("MOCK0", config);
        assert_eq!(port.line_config().unwrap().baud_rate, 9600);
    }
}
