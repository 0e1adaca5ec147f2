//! POSIX terminal I/O backend.
//!
//! Opens the device with `O_RDWR | O_NOCTTY | O_NONBLOCK` so the handle is
//! read/write, never becomes the controlling terminal, and reads return
//! immediately when no data is buffered. Line parameters are programmed
//! through termios, with the line forced into raw mode so bytes pass through
//! unmodified in both directions.

use std::ffi::CString;
use std::io;
use std::os::unix::io::RawFd;

use tracing::{debug, warn};

use super::config::{DataBits, LineConfig, Parity, StopBits};
use super::error::PortError;
use super::traits::SerialPortAdapter;

/// Sentinel for "not open"; the only legal handle state before open and after
/// close.
const INVALID_FD: RawFd = -1;

/// Requested baud rate paired with the termios speed constant that programs it.
const BAUD_TABLE: [(u32, libc::speed_t); 5] = [
    (9600, libc::B9600),
    (19_200, libc::B19200),
    (38_400, libc::B38400),
    (57_600, libc::B57600),
    (115_200, libc::B115200),
];

fn baud_constant(baud: u32) -> libc::speed_t {
    BAUD_TABLE
        .iter()
        .find(|(value, _)| *value == baud)
        .map(|(_, constant)| *constant)
        .unwrap_or(libc::B9600)
}

fn baud_value(speed: libc::speed_t) -> u32 {
    BAUD_TABLE
        .iter()
        .find(|(_, constant)| *constant == speed)
        .map(|(value, _)| *value)
        .unwrap_or(9600)
}

/// Serial port backed by a POSIX file descriptor.
pub struct PosixSerialPort {
    fd: RawFd,
    name: String,
}

impl PosixSerialPort {
    /// Open and configure a serial device.
    ///
    /// An unsupported `config.baud_rate` is programmed as 9600 rather than
    /// rejected; see [`LineConfig`] for the rationale. Any configuration
    /// failure releases the just-acquired descriptor before returning, so an
    /// `Err` never leaks a handle.
    pub fn open(path: &str, config: LineConfig) -> Result<Self, PortError> {
        if path.is_empty() {
            return Err(PortError::invalid_argument("device path must not be empty"));
        }
        let c_path = CString::new(path)
            .map_err(|_| PortError::invalid_argument("device path contains a NUL byte"))?;

        let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR | libc::O_NOCTTY | libc::O_NONBLOCK) };
        if fd < 0 {
            return Err(PortError::open_failed(path, io::Error::last_os_error()));
        }

        if let Err(source) = apply_line_config(fd, &config) {
            warn!(path, %source, "line configuration failed, releasing descriptor");
            unsafe { libc::close(fd) };
            return Err(PortError::config_failed(source));
        }

        debug!(path, baud = config.effective_baud(), "serial port opened");
        Ok(Self {
            fd,
            name: path.to_string(),
        })
    }

    /// Open with the default 9600-8N1 configuration.
    pub fn open_default(path: &str) -> Result<Self, PortError> {
        Self::open(path, LineConfig::default())
    }
}

/// Translate a [`LineConfig`] into termios fields and apply it, forcing raw
/// mode: no canonical editing, echo, signal generation, software flow
/// control, CR/NL translation, or output post-processing.
fn apply_line_config(fd: RawFd, config: &LineConfig) -> io::Result<()> {
    let mut tio = unsafe { std::mem::zeroed::<libc::termios>() };
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let speed = baud_constant(config.effective_baud());
    if unsafe { libc::cfsetispeed(&mut tio, speed) } != 0
        || unsafe { libc::cfsetospeed(&mut tio, speed) } != 0
    {
        return Err(io::Error::last_os_error());
    }

    tio.c_cflag &= !libc::CSIZE;
    tio.c_cflag |= match config.data_bits {
        DataBits::Seven => libc::CS7,
        DataBits::Eight => libc::CS8,
    };

    match config.stop_bits {
        StopBits::One => tio.c_cflag &= !libc::CSTOPB,
        StopBits::Two => tio.c_cflag |= libc::CSTOPB,
    }

    match config.parity {
        Parity::None => tio.c_cflag &= !(libc::PARENB | libc::PARODD),
        Parity::Odd => tio.c_cflag |= libc::PARENB | libc::PARODD,
        Parity::Even => {
            tio.c_cflag |= libc::PARENB;
            tio.c_cflag &= !libc::PARODD;
        }
    }

    // Raw mode: receiver on, modem control lines ignored, every byte passed
    // through untouched.
    tio.c_cflag |= libc::CLOCAL | libc::CREAD;
    tio.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ECHOE | libc::ISIG);
    tio.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY | libc::ICRNL | libc::INLCR);
    tio.c_oflag &= !libc::OPOST;

    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl SerialPortAdapter for PosixSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        if self.fd == INVALID_FD {
            return Err(PortError::InvalidHandle);
        }
        if data.is_empty() {
            return Ok(0);
        }
        let written =
            unsafe { libc::write(self.fd, data.as_ptr() as *const libc::c_void, data.len()) };
        if written < 0 {
            let source = io::Error::last_os_error();
            warn!(port = %self.name, %source, "native write failed");
            return Err(PortError::WriteFailed { source });
        }
        Ok(written as usize)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        if self.fd == INVALID_FD {
            return Err(PortError::InvalidHandle);
        }
        if buffer.is_empty() {
            return Ok(0);
        }
        let read =
            unsafe { libc::read(self.fd, buffer.as_mut_ptr() as *mut libc::c_void, buffer.len()) };
        if read < 0 {
            let source = io::Error::last_os_error();
            // On a non-blocking descriptor EAGAIN/EWOULDBLOCK means "nothing
            // buffered yet", which the contract reports as a zero-byte
            // success, not a failure.
            if source.kind() == io::ErrorKind::WouldBlock {
                return Ok(0);
            }
            warn!(port = %self.name, %source, "native read failed");
            return Err(PortError::ReadFailed { source });
        }
        Ok(read as usize)
    }

    fn line_config(&self) -> Result<LineConfig, PortError> {
        if self.fd == INVALID_FD {
            return Err(PortError::InvalidHandle);
        }
        let mut tio = unsafe { std::mem::zeroed::<libc::termios>() };
        if unsafe { libc::tcgetattr(self.fd, &mut tio) } != 0 {
            return Err(PortError::config_failed(io::Error::last_os_error()));
        }

        let data_bits = if tio.c_cflag & libc::CSIZE == libc::CS7 {
            DataBits::Seven
        } else {
            DataBits::Eight
        };
        let stop_bits = if tio.c_cflag & libc::CSTOPB != 0 {
            StopBits::Two
        } else {
            StopBits::One
        };
        let parity = if tio.c_cflag & libc::PARENB == 0 {
            Parity::None
        } else if tio.c_cflag & libc::PARODD != 0 {
            Parity::Odd
        } else {
            Parity::Even
        };

        Ok(LineConfig {
            baud_rate: baud_value(unsafe { libc::cfgetospeed(&tio) }),
            data_bits,
            stop_bits,
            parity,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.fd != INVALID_FD
    }

    fn close(&mut self) -> Result<(), PortError> {
        if self.fd == INVALID_FD {
            return Err(PortError::InvalidHandle);
        }
        // Invalidate first: even if the native release reports a failure the
        // handle must not remain usable.
        let fd = std::mem::replace(&mut self.fd, INVALID_FD);
        if unsafe { libc::close(fd) } != 0 {
            return Err(PortError::CloseFailed {
                source: io::Error::last_os_error(),
            });
        }
        debug!(port = %self.name, "serial port closed");
        Ok(())
    }
}

impl Drop for PosixSerialPort {
    fn drop(&mut self) {
        if self.fd != INVALID_FD {
            // Best-effort release for abandoned handles.
            unsafe { libc::close(self.fd) };
        }
    }
}

impl std::fmt::Debug for PosixSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosixSerialPort")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_rejected() {
        let result = PosixSerialPort::open("", LineConfig::default());
        assert!(matches!(result, Err(PortError::InvalidArgument(_))));
    }

    #[test]
    fn test_interior_nul_is_rejected() {
        let result = PosixSerialPort::open("/dev/tty\0ACM0", LineConfig::default());
        assert!(matches!(result, Err(PortError::InvalidArgument(_))));
    }

    #[test]
    fn test_nonexistent_device_is_open_failed() {
        let result = PosixSerialPort::open_default("/dev/nonexistent_serial_device_12345");
        assert!(matches!(result, Err(PortError::OpenFailed { .. })));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_terminal_device_rolls_back_to_config_failed() {
        // /dev/null opens fine but tcgetattr fails with ENOTTY, so the open
        // must release the descriptor and report ConfigFailed.
        let result = PosixSerialPort::open_default("/dev/null");
        assert!(matches!(result, Err(PortError::ConfigFailed { .. })));
    }

    #[test]
    fn test_baud_constant_fallback() {
        assert_eq!(baud_constant(115_200), libc::B115200);
        assert_eq!(baud_constant(31_250), libc::B9600);
        assert_eq!(baud_value(libc::B57600), 57_600);
    }
}
