//! Serial Commander Library
//!
//! Drives a microcontroller (e.g. an Arduino) over a serial link: single-byte
//! commands out, best-effort text responses back.
//!
//! # Modules
//!
//! - `port`: cross-platform serial port abstraction (handle lifecycle, line
//!   configuration, non-blocking byte I/O, closed error taxonomy)
//! - `session`: write-command / pause / read-response cycle over a port
//! - `menu`: interactive option table and keypress mapping for the CLI
//!
//! The port layer is the core: one contract over two native backends (POSIX
//! termios and the Win32 comm API) selected at build time, plus an in-memory
//! mock for tests.

pub mod menu;
pub mod port;
pub mod session;

// Re-export commonly used types for convenience
pub use port::{
    DataBits, LineConfig, MockSerialPort, NativeSerialPort, Parity, PortError, SerialPortAdapter,
    StopBits,
};
pub use session::{CommandSession, SessionError};
