use std::io::{self, BufRead, Write};
use std::time::Duration;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use serial_commander::menu::{self, MenuChoice};
use serial_commander::{CommandSession, DataBits, LineConfig, NativeSerialPort, Parity, StopBits};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Drive a microcontroller over a serial link with single-byte commands.",
    long_about = "Opens one serial device, then runs an interactive menu: each selection \
sends a single command byte and prints the device's text reply. Line parameters \
default to 9600-8N1; an unsupported baud rate is programmed as 9600 rather than \
rejected."
)]
struct Args {
    /// Serial device path, e.g. /dev/ttyACM0 or COM3.
    path: String,

    /// Baud rate. Supported: 9600, 19200, 38400, 57600, 115200; anything else
    /// is programmed as 9600.
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Data bits per character.
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u8).range(7..=8))]
    data_bits: u8,

    /// Stop bits.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    stop_bits: u8,

    /// Parity: none, odd, or even.
    #[arg(long, default_value = "none", value_parser = parse_parity)]
    parity: Parity,

    /// Time given to the device to process a command before its reply is
    /// read, in milliseconds.
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,
}

fn parse_parity(value: &str) -> Result<Parity, String> {
    match value {
        "none" => Ok(Parity::None),
        "odd" => Ok(Parity::Odd),
        "even" => Ok(Parity::Even),
        other => Err(format!("unknown parity '{other}' (expected none, odd, or even)")),
    }
}

impl Args {
    fn line_config(&self) -> LineConfig {
        LineConfig {
            baud_rate: self.baud,
            data_bits: if self.data_bits == 7 {
                DataBits::Seven
            } else {
                DataBits::Eight
            },
            stop_bits: if self.stop_bits == 2 {
                StopBits::Two
            } else {
                StopBits::One
            },
            parity: self.parity,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for the menu.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let port = NativeSerialPort::open(&args.path, args.line_config())?;
    println!("Connected to {}", args.path);

    let session = CommandSession::with_delay(port, Duration::from_millis(args.delay_ms));
    run_menu_loop(session)
}

fn run_menu_loop(
    mut session: CommandSession<NativeSerialPort>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", menu::render_menu());
        io::stdout().flush()?;

        // EOF ends the session the same way as quitting.
        let Some(line) = lines.next() else { break };

        match menu::parse_choice(&line?) {
            MenuChoice::Quit => break,
            MenuChoice::Invalid => {
                println!("Invalid option. Please select 1-4, or 5 to quit.");
            }
            MenuChoice::Command(byte) => match session.send_command(byte) {
                Ok(response) if response.is_empty() => {
                    println!("No response from device yet.");
                }
                Ok(response) => {
                    print!("Device response: {response}");
                    if !response.ends_with('\n') {
                        println!();
                    }
                }
                Err(err) => {
                    // A failed write or read mid-session leaves the device
                    // possibly desynchronized; stop instead of continuing.
                    eprintln!("Error during communication with device: {err}");
                    if let Err(close_err) = session.shutdown() {
                        warn!(%close_err, "port close failed after I/O error");
                    }
                    return Err(err.into());
                }
            },
        }
    }

    session.shutdown()?;
    println!("Session ended.");
    Ok(())
}
