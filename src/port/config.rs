//! Serial line configuration.
//!
//! The `LineConfig` value object describes the wire parameters applied when a
//! port is opened, mirroring what both native backends can express: baud rate,
//! data bits, stop bits, and parity. Flow control is always off; the port is
//! put into raw mode so every byte passes through unmodified.

use serde::{Deserialize, Serialize};

/// Baud rates the layer knows how to program on both backends.
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19_200, 38_400, 57_600, 115_200];

/// Baud rate used when the caller requests a rate outside
/// [`SUPPORTED_BAUD_RATES`], and the default rate.
pub const FALLBACK_BAUD_RATE: u32 = 9600;

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Seven,
    Eight,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Wire parameters for a serial line.
///
/// # Baud rate fallback
///
/// A `baud_rate` outside [`SUPPORTED_BAUD_RATES`] does **not** fail the open:
/// the line is configured at 9600 baud instead. This permissive fallback is a
/// deliberate part of the contract (it lets a misconfigured caller still talk
/// to the common 9600-baud firmware) — use [`LineConfig::effective_baud`] to
/// see the rate that will actually be programmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineConfig {
    /// Requested baud rate (bits per second).
    pub baud_rate: u32,
    /// Number of data bits (7 or 8).
    pub data_bits: DataBits,
    /// Number of stop bits (1 or 2).
    pub stop_bits: StopBits,
    /// Parity checking mode.
    pub parity: Parity,
}

impl Default for LineConfig {
    /// 9600 baud, 8 data bits, 1 stop bit, no parity.
    fn default() -> Self {
        Self {
            baud_rate: FALLBACK_BAUD_RATE,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
        }
    }
}

impl LineConfig {
    /// The baud rate that will actually be programmed on the line: the
    /// requested rate if supported, otherwise [`FALLBACK_BAUD_RATE`].
    pub fn effective_baud(&self) -> u32 {
        if SUPPORTED_BAUD_RATES.contains(&self.baud_rate) {
            self.baud_rate
        } else {
            FALLBACK_BAUD_RATE
        }
    }
}
