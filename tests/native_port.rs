//! Integration tests for the native POSIX backend.
//!
//! The path-validation tests run on any unix target. The loopback tests run
//! on Linux against a pseudo-terminal: the slave side behaves like a real
//! serial device (termios, non-blocking reads), and the master side plays the
//! firmware, so the full open/configure/write/read/close cycle is exercised
//! against a real file descriptor without hardware.

#![cfg(unix)]

use serial_commander::port::{LineConfig, NativeSerialPort, PortError, SerialPortAdapter};

#[test]
fn empty_path_is_invalid_argument() {
    let result = NativeSerialPort::open("", LineConfig::default());
    assert!(matches!(result, Err(PortError::InvalidArgument(_))));
}

#[test]
fn nonexistent_device_is_open_failed_never_a_handle() {
    let result = NativeSerialPort::open_default("/dev/does_not_exist_98765");
    match result {
        Err(PortError::OpenFailed { path, .. }) => assert!(path.contains("does_not_exist")),
        other => panic!("expected OpenFailed, got {other:?}"),
    }
}

#[cfg(target_os = "linux")]
mod pty_loopback {
    use super::*;
    use serial_commander::port::{DataBits, Parity, StopBits};
    use serial_commander::CommandSession;
    use std::ffi::CStr;
    use std::io;
    use std::os::unix::io::RawFd;
    use std::time::Duration;

    /// Master side of a pseudo-terminal pair; the slave path is handed to the
    /// port layer as the "device".
    struct PtyDevice {
        master: RawFd,
        slave_path: String,
    }

    impl PtyDevice {
        fn open() -> io::Result<Self> {
            let master = unsafe { libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY) };
            if master < 0 {
                return Err(io::Error::last_os_error());
            }
            if unsafe { libc::grantpt(master) } != 0 || unsafe { libc::unlockpt(master) } != 0 {
                let err = io::Error::last_os_error();
                unsafe { libc::close(master) };
                return Err(err);
            }
            let mut buf = [0 as libc::c_char; 128];
            if unsafe { libc::ptsname_r(master, buf.as_mut_ptr(), buf.len()) } != 0 {
                let err = io::Error::last_os_error();
                unsafe { libc::close(master) };
                return Err(err);
            }
            let slave_path = unsafe { CStr::from_ptr(buf.as_ptr()) }
                .to_string_lossy()
                .into_owned();
            Ok(Self { master, slave_path })
        }

        /// Push bytes toward the port, as the device firmware would.
        fn send(&self, data: &[u8]) -> io::Result<usize> {
            let n = unsafe {
                libc::write(self.master, data.as_ptr() as *const libc::c_void, data.len())
            };
            if n < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(n as usize)
        }

        /// Collect bytes the port wrote.
        fn receive(&self, buf: &mut [u8]) -> io::Result<usize> {
            let n = unsafe {
                libc::read(self.master, buf.as_mut_ptr() as *mut libc::c_void, buf.len())
            };
            if n < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(n as usize)
        }
    }

    impl Drop for PtyDevice {
        fn drop(&mut self) {
            unsafe { libc::close(self.master) };
        }
    }

    fn settle() {
        std::thread::sleep(Duration::from_millis(20));
    }

    #[test]
    fn open_idle_read_write_and_close_cycle() {
        let device = PtyDevice::open().expect("pty available");
        let mut port = NativeSerialPort::open_default(&device.slave_path).expect("open slave");

        assert!(port.is_open());
        assert_eq!(port.name(), device.slave_path);

        // Freshly opened and idle: the non-blocking read reports "nothing
        // yet" as a zero-byte success.
        let mut buffer = [0u8; 256];
        assert_eq!(port.read_bytes(&mut buffer).unwrap(), 0);

        // Zero-size I/O succeeds without touching the descriptor.
        assert_eq!(port.write_bytes(&[]).unwrap(), 0);
        assert_eq!(port.read_bytes(&mut []).unwrap(), 0);

        // Command byte reaches the device side verbatim.
        assert_eq!(port.write_bytes(b"1").unwrap(), 1);
        settle();
        let mut received = [0u8; 8];
        let n = device.receive(&mut received).unwrap();
        assert_eq!(&received[..n], b"1");

        // Device reply comes back in order, truncated only by the buffer.
        device.send(b"Red LED on\n").unwrap();
        settle();
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"Red LED on\n");

        port.close().expect("close succeeds");
        assert!(!port.is_open());

        // All further use is rejected without touching the OS.
        assert!(matches!(port.close(), Err(PortError::InvalidHandle)));
        assert!(matches!(port.write_bytes(b"1"), Err(PortError::InvalidHandle)));
        assert!(matches!(
            port.read_bytes(&mut buffer),
            Err(PortError::InvalidHandle)
        ));
    }

    #[test]
    fn requested_line_parameters_are_readable_back() {
        let device = PtyDevice::open().expect("pty available");
        let requested = LineConfig {
            baud_rate: 57_600,
            data_bits: DataBits::Seven,
            stop_bits: StopBits::Two,
            parity: Parity::Even,
        };
        let mut port = NativeSerialPort::open(&device.slave_path, requested).expect("open slave");

        let effective = port.line_config().unwrap();
        assert_eq!(effective, requested);

        port.close().unwrap();
    }

    #[test]
    fn unsupported_baud_is_programmed_as_9600() {
        let device = PtyDevice::open().expect("pty available");
        let requested = LineConfig {
            baud_rate: 31_250, // MIDI rate, not in the supported set
            ..Default::default()
        };
        let mut port = NativeSerialPort::open(&device.slave_path, requested).expect("open slave");

        assert_eq!(port.line_config().unwrap().baud_rate, 9600);

        port.close().unwrap();
    }

    #[test]
    fn command_session_runs_over_the_native_backend() {
        let device = PtyDevice::open().expect("pty available");
        let port = NativeSerialPort::open_default(&device.slave_path).expect("open slave");

        device.send(b"Yellow LED on\n").unwrap();

        let mut session = CommandSession::with_delay(port, Duration::from_millis(50));
        let response = session.send_command(b'2').unwrap();
        assert_eq!(response, "Yellow LED on\n");

        let mut received = [0u8; 8];
        let n = device.receive(&mut received).unwrap();
        assert_eq!(&received[..n], b"2");

        session.shutdown().unwrap();
    }
}
