//! Command/response session over an open serial port.
//!
//! Owns one open port and runs the strict request/response cycle the firmware
//! expects: exactly one command byte out, a short pause while the device
//! processes it, then a bounded best-effort read of the text reply. The pause
//! is a policy of this layer, not of the port contract — the port itself never
//! blocks.

use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::port::{PortError, SerialPortAdapter};

/// Size of the response buffer handed to each read.
pub const READ_BUFFER_SIZE: usize = 256;

/// Time allowed for the device to process a command before the reply is read.
pub const DEFAULT_COMMAND_DELAY: Duration = Duration::from_millis(100);

/// Errors surfaced by a command session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying port operation failed. Mid-session I/O failures leave
    /// the device possibly desynchronized; callers should end the session.
    #[error(transparent)]
    Port(#[from] PortError),

    /// The driver accepted fewer than the one command byte.
    #[error("device did not accept the command byte")]
    CommandNotAccepted,
}

/// One open port plus the request/response pacing policy.
#[derive(Debug)]
pub struct CommandSession<P: SerialPortAdapter> {
    port: P,
    delay: Duration,
}

impl<P: SerialPortAdapter> CommandSession<P> {
    /// Wrap an already-open port with the default 100 ms pacing.
    pub fn new(port: P) -> Self {
        Self::with_delay(port, DEFAULT_COMMAND_DELAY)
    }

    /// Wrap an already-open port with an explicit inter-command delay.
    pub fn with_delay(port: P, delay: Duration) -> Self {
        Self { port, delay }
    }

    /// Access the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Send one command byte and collect the device's best-effort text reply.
    ///
    /// An empty string means the device had nothing to say yet — that is a
    /// normal outcome on a non-blocking port, not an error.
    pub fn send_command(&mut self, command: u8) -> Result<String, SessionError> {
        let written = self.port.write_bytes(&[command])?;
        if written != 1 {
            warn!(port = %self.port.name(), command, "short write of command byte");
            return Err(SessionError::CommandNotAccepted);
        }
        debug!(port = %self.port.name(), command, "command sent");

        thread::sleep(self.delay);

        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let n = self.port.read_bytes(&mut buffer)?;
        debug!(port = %self.port.name(), bytes = n, "response read");
        Ok(String::from_utf8_lossy(&buffer[..n]).into_owned())
    }

    /// End the session, releasing the port.
    pub fn shutdown(mut self) -> Result<(), SessionError> {
        self.port.close()?;
        Ok(())
    }
}
