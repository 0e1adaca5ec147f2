//! Port abstraction layer for serial communication.
//!
//! One contract, two native backends: POSIX terminal I/O on unix targets and
//! the Win32 comm API on windows targets, selected at build time and exported
//! as [`NativeSerialPort`]. A [`MockSerialPort`] implements the same trait for
//! tests. All backends are synchronous and non-blocking: no operation ever
//! suspends the caller waiting for device data.

pub mod config;
pub mod error;
pub mod mock;
pub mod traits;

#[cfg(unix)]
pub mod posix;

#[cfg(windows)]
pub mod win32;

pub use config::{
    DataBits, LineConfig, Parity, StopBits, FALLBACK_BAUD_RATE, SUPPORTED_BAUD_RATES,
};
pub use error::PortError;
pub use mock::MockSerialPort;
pub use traits::SerialPortAdapter;

/// The native backend for the current target.
#[cfg(unix)]
pub use posix::PosixSerialPort as NativeSerialPort;

/// The native backend for the current target.
#[cfg(windows)]
pub use win32::Win32SerialPort as NativeSerialPort;
