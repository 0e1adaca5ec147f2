//! Core trait for the serial port abstraction.
//!
//! `SerialPortAdapter` is the capability interface every backend implements:
//! the two native backends selected at build time, and the in-memory mock used
//! by tests. All of them must satisfy the same contract, including the rule
//! that a non-blocking read with no data available is a zero-byte success.

use super::config::LineConfig;
use super::error::PortError;

/// Trait for serial port I/O operations.
///
/// # Contract
///
/// * Every operation on a closed handle fails with [`PortError::InvalidHandle`]
///   without touching the OS.
/// * `write_bytes(&[])` and `read_bytes(&mut [])` succeed with a count of 0
///   without touching the OS.
/// * "No data currently available" on a read is `Ok(0)`, never
///   [`PortError::ReadFailed`].
/// * Reported byte counts never exceed the supplied buffer length.
/// * Short writes are reported verbatim; retrying is the caller's business.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port with a single native attempt.
    ///
    /// Returns the number of bytes actually accepted by the device driver,
    /// which may be less than `data.len()`.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer with a single
    /// native attempt.
    ///
    /// Returns the number of bytes actually read; `Ok(0)` means "nothing
    /// available yet" and is a normal outcome on a non-blocking port.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Query the line configuration currently in effect on the device.
    fn line_config(&self) -> Result<LineConfig, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Whether the handle is currently open.
    fn is_open(&self) -> bool;

    /// Release the native resource.
    ///
    /// Fails with [`PortError::InvalidHandle`] if already closed. If the
    /// native release itself fails, [`PortError::CloseFailed`] is reported but
    /// the handle is invalidated regardless; it must not be used afterwards.
    fn close(&mut self) -> Result<(), PortError>;
}
