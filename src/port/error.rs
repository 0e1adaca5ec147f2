//! Port-specific error types.
//!
//! Defines the closed error taxonomy for serial port operations. Every native
//! failure on either backend is translated into exactly one of these variants
//! at the point of occurrence; nothing is caught and retried inside the layer.

use thiserror::Error;

/// Errors that can occur during serial port operations.
///
/// The set is identical on both native backends, so callers can match on it
/// without platform conditionals.
#[derive(Debug, Error)]
pub enum PortError {
    /// A required input (e.g. the device path) was empty or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation attempted on a handle that is not open (never opened, or
    /// already closed).
    #[error("Port handle is not open")]
    InvalidHandle,

    /// Native device acquisition failed: device absent, permission denied,
    /// or already exclusively held.
    #[error("Failed to open serial port {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Native line-control get/set failed. When this happens during open, the
    /// just-acquired native handle is released before the error is returned,
    /// so no handle ever leaks to the caller.
    #[error("Failed to configure serial line: {source}")]
    ConfigFailed {
        #[source]
        source: std::io::Error,
    },

    /// The native write call failed. A short write is not an error and is
    /// reported through the byte count instead.
    #[error("Write to serial port failed: {source}")]
    WriteFailed {
        #[source]
        source: std::io::Error,
    },

    /// The native read call failed for a reason other than "no data currently
    /// available" (which is a zero-byte success, not an error).
    #[error("Read from serial port failed: {source}")]
    ReadFailed {
        #[source]
        source: std::io::Error,
    },

    /// The native release call failed. The handle must be treated as unusable
    /// afterwards regardless of this being reported.
    #[error("Failed to close serial port: {source}")]
    CloseFailed {
        #[source]
        source: std::io::Error,
    },
}

impl PortError {
    /// Create an `InvalidArgument` error from a message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an `OpenFailed` error from a path and the OS error.
    pub fn open_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::OpenFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a `ConfigFailed` error from the OS error.
    pub fn config_failed(source: std::io::Error) -> Self {
        Self::ConfigFailed { source }
    }
}
