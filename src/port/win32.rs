//! Win32 comm-API backend.
//!
//! Opens the device with `CreateFileA` for simultaneous read/write, programs
//! the line through a DCB, and configures `COMMTIMEOUTS` with
//! `ReadIntervalTimeout = MAXDWORD` and zero totals so `ReadFile` returns
//! immediately with whatever is buffered (possibly nothing). That makes "no
//! data yet" an ordinary zero-byte success on this backend, matching the
//! POSIX side's EAGAIN translation.

use std::ffi::CString;
use std::io;
use std::ptr;

use tracing::{debug, warn};

use winapi::shared::minwindef::{DWORD, MAXDWORD};
use winapi::um::commapi::{GetCommState, SetCommState, SetCommTimeouts};
use winapi::um::fileapi::{CreateFileA, ReadFile, WriteFile, OPEN_EXISTING};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::winbase::{
    COMMTIMEOUTS, DCB, EVENPARITY, NOPARITY, ODDPARITY, ONESTOPBIT, TWOSTOPBITS,
};
use winapi::um::winnt::{FILE_ATTRIBUTE_NORMAL, GENERIC_READ, GENERIC_WRITE, HANDLE};

use super::config::{DataBits, LineConfig, Parity, StopBits};
use super::error::PortError;
use super::traits::SerialPortAdapter;

/// Serial port backed by a Win32 file handle.
pub struct Win32SerialPort {
    handle: HANDLE,
    name: String,
}

// HANDLE is a raw pointer, but the kernel object it names is exclusively
// owned by this struct and all access goes through &mut self.
unsafe impl Send for Win32SerialPort {}

impl Win32SerialPort {
    /// Open and configure a serial device (e.g. `COM3` or `\\.\COM12`).
    ///
    /// An unsupported `config.baud_rate` is programmed as 9600 rather than
    /// rejected; see [`LineConfig`]. Any configuration failure releases the
    /// just-acquired handle before returning, so an `Err` never leaks one.
    pub fn open(path: &str, config: LineConfig) -> Result<Self, PortError> {
        if path.is_empty() {
            return Err(PortError::invalid_argument("device path must not be empty"));
        }
        let c_path = CString::new(path)
            .map_err(|_| PortError::invalid_argument("device path contains a NUL byte"))?;

        let handle = unsafe {
            CreateFileA(
                c_path.as_ptr(),
                GENERIC_READ | GENERIC_WRITE,
                0, // no sharing: the device is exclusively held
                ptr::null_mut(),
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                ptr::null_mut(),
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            return Err(PortError::open_failed(path, io::Error::last_os_error()));
        }

        if let Err(source) = apply_line_config(handle, &config) {
            warn!(path, %source, "line configuration failed, releasing handle");
            unsafe { CloseHandle(handle) };
            return Err(PortError::config_failed(source));
        }

        debug!(path, baud = config.effective_baud(), "serial port opened");
        Ok(Self {
            handle,
            name: path.to_string(),
        })
    }

    /// Open with the default 9600-8N1 configuration.
    pub fn open_default(path: &str) -> Result<Self, PortError> {
        Self::open(path, LineConfig::default())
    }
}

/// Translate a [`LineConfig`] into DCB fields, apply it, and set the timeout
/// recipe that makes reads non-blocking.
fn apply_line_config(handle: HANDLE, config: &LineConfig) -> io::Result<()> {
    let mut dcb = unsafe { std::mem::zeroed::<DCB>() };
    dcb.DCBlength = std::mem::size_of::<DCB>() as DWORD;
    if unsafe { GetCommState(handle, &mut dcb) } == 0 {
        return Err(io::Error::last_os_error());
    }

    dcb.BaudRate = config.effective_baud();
    dcb.ByteSize = match config.data_bits {
        DataBits::Seven => 7,
        DataBits::Eight => 8,
    };
    dcb.StopBits = match config.stop_bits {
        StopBits::One => ONESTOPBIT,
        StopBits::Two => TWOSTOPBITS,
    } as u8;
    dcb.Parity = match config.parity {
        Parity::None => NOPARITY,
        Parity::Odd => ODDPARITY,
        Parity::Even => EVENPARITY,
    } as u8;
    dcb.set_fBinary(1);
    dcb.set_fParity(if config.parity == Parity::None { 0 } else { 1 });
    // Software flow control off: raw bytes only.
    dcb.set_fOutX(0);
    dcb.set_fInX(0);

    if unsafe { SetCommState(handle, &mut dcb) } == 0 {
        return Err(io::Error::last_os_error());
    }

    // MAXDWORD interval with zero totals: ReadFile returns at once with the
    // bytes already buffered, or with zero when the queue is empty.
    let mut timeouts = unsafe { std::mem::zeroed::<COMMTIMEOUTS>() };
    timeouts.ReadIntervalTimeout = MAXDWORD;
    timeouts.ReadTotalTimeoutConstant = 0;
    timeouts.ReadTotalTimeoutMultiplier = 0;
    timeouts.WriteTotalTimeoutConstant = 0;
    timeouts.WriteTotalTimeoutMultiplier = 0;
    if unsafe { SetCommTimeouts(handle, &mut timeouts) } == 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

impl SerialPortAdapter for Win32SerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        if self.handle == INVALID_HANDLE_VALUE {
            return Err(PortError::InvalidHandle);
        }
        if data.is_empty() {
            return Ok(0);
        }
        let len = data.len().min(MAXDWORD as usize) as DWORD;
        let mut written: DWORD = 0;
        let ok = unsafe {
            WriteFile(
                self.handle,
                data.as_ptr().cast(),
                len,
                &mut written,
                ptr::null_mut(),
            )
        };
        if ok == 0 {
            let source = io::Error::last_os_error();
            warn!(port = %self.name, %source, "native write failed");
            return Err(PortError::WriteFailed { source });
        }
        Ok(written as usize)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        if self.handle == INVALID_HANDLE_VALUE {
            return Err(PortError::InvalidHandle);
        }
        if buffer.is_empty() {
            return Ok(0);
        }
        let len = buffer.len().min(MAXDWORD as usize) as DWORD;
        let mut read: DWORD = 0;
        let ok = unsafe {
            ReadFile(
                self.handle,
                buffer.as_mut_ptr().cast(),
                len,
                &mut read,
                ptr::null_mut(),
            )
        };
        if ok == 0 {
            let source = io::Error::last_os_error();
            warn!(port = %self.name, %source, "native read failed");
            return Err(PortError::ReadFailed { source });
        }
        // An empty input queue yields ok with read == 0 under the configured
        // timeouts, which is exactly the zero-byte success the contract wants.
        Ok(read as usize)
    }

    fn line_config(&self) -> Result<LineConfig, PortError> {
        if self.handle == INVALID_HANDLE_VALUE {
            return Err(PortError::InvalidHandle);
        }
        let mut dcb = unsafe { std::mem::zeroed::<DCB>() };
        dcb.DCBlength = std::mem::size_of::<DCB>() as DWORD;
        if unsafe { GetCommState(self.handle, &mut dcb) } == 0 {
            return Err(PortError::config_failed(io::Error::last_os_error()));
        }

        Ok(LineConfig {
            baud_rate: dcb.BaudRate,
            data_bits: if dcb.ByteSize == 7 {
                DataBits::Seven
            } else {
                DataBits::Eight
            },
            stop_bits: if dcb.StopBits == TWOSTOPBITS as u8 {
                StopBits::Two
            } else {
                StopBits::One
            },
            parity: match dcb.Parity as DWORD {
                ODDPARITY => Parity::Odd,
                EVENPARITY => Parity::Even,
                _ => Parity::None,
            },
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.handle != INVALID_HANDLE_VALUE
    }

    fn close(&mut self) -> Result<(), PortError> {
        if self.handle == INVALID_HANDLE_VALUE {
            return Err(PortError::InvalidHandle);
        }
        // Invalidate first: even if the native release reports a failure the
        // handle must not remain usable.
        let handle = std::mem::replace(&mut self.handle, INVALID_HANDLE_VALUE);
        if unsafe { CloseHandle(handle) } == 0 {
            return Err(PortError::CloseFailed {
                source: io::Error::last_os_error(),
            });
        }
        debug!(port = %self.name, "serial port closed");
        Ok(())
    }
}

impl Drop for Win32SerialPort {
    fn drop(&mut self) {
        if self.handle != INVALID_HANDLE_VALUE {
            // Best-effort release for abandoned handles.
            unsafe { CloseHandle(self.handle) };
        }
    }
}

impl std::fmt::Debug for Win32SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Win32SerialPort")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}
