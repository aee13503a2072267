//! Supported line speeds.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Line speeds the reader knows how to program into the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
}

impl BaudRate {
    /// Rate substituted for unsupported requests.
    pub const FALLBACK: BaudRate = BaudRate::B115200;

    /// Every supported rate, slowest first.
    pub const ALL: [BaudRate; 6] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
        BaudRate::B230400,
    ];

    /// Look up a rate given in bits per second.
    pub fn from_bps(bps: u32) -> Option<Self> {
        match bps {
            9600 => Some(Self::B9600),
            19200 => Some(Self::B19200),
            38400 => Some(Self::B38400),
            57600 => Some(Self::B57600),
            115200 => Some(Self::B115200),
            230400 => Some(Self::B230400),
            _ => None,
        }
    }

    /// Look up a rate, substituting [`BaudRate::FALLBACK`] for unsupported values.
    ///
    /// The substitution is logged at `warn` level but is otherwise silent; use
    /// [`BaudRate::from_bps`] to reject unsupported values instead.
    pub fn resolve(bps: u32) -> Self {
        Self::from_bps(bps).unwrap_or_else(|| {
            warn!(
                requested = bps,
                fallback = Self::FALLBACK.bps(),
                "unsupported baud rate, falling back"
            );
            Self::FALLBACK
        })
    }

    /// The rate in bits per second.
    pub fn bps(self) -> u32 {
        match self {
            Self::B9600 => 9600,
            Self::B19200 => 19200,
            Self::B38400 => 38400,
            Self::B57600 => 57600,
            Self::B115200 => 115200,
            Self::B230400 => 230400,
        }
    }

    /// The termios speed constant for this rate.
    pub(crate) fn speed(self) -> libc::speed_t {
        match self {
            Self::B9600 => libc::B9600,
            Self::B19200 => libc::B19200,
            Self::B38400 => libc::B38400,
            Self::B57600 => libc::B57600,
            Self::B115200 => libc::B115200,
            Self::B230400 => libc::B230400,
        }
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bps())
    }
}

/// Returned when a rate outside the supported table is converted strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unsupported baud rate {0}")]
pub struct UnsupportedBaudRate(pub u32);

impl TryFrom<u32> for BaudRate {
    type Error = UnsupportedBaudRate;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Self::from_bps(bps).ok_or(UnsupportedBaudRate(bps))
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.bps()
    }
}
