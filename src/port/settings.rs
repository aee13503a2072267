//! Reader configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default line delimiter: carriage return followed by line feed.
pub const DEFAULT_DELIMITER: &[u8] = b"\r\n";

/// Default line speed in bits per second.
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Parameters for opening a [`LineReader`](crate::LineReader).
///
/// The reader keeps its own copy, so changing a config after `open` has no
/// effect on readers already created from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Path of the character device, e.g. `/dev/ttyUSB0`.
    pub device: PathBuf,

    /// Requested line speed. Values outside the supported table fall back to
    /// 115200 (see [`BaudRate::resolve`](crate::BaudRate::resolve)).
    pub baud_rate: u32,

    /// Byte sequence that terminates a line. Must not be empty.
    pub delimiter: Vec<u8>,

    /// Idle deadline for the readiness wait. `None` waits indefinitely.
    pub read_timeout: Option<Duration>,
}

impl ReaderConfig {
    /// Configuration for `device` with default speed, delimiter and no timeout.
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            delimiter: DEFAULT_DELIMITER.to_vec(),
            read_timeout: None,
        }
    }

    /// Requested line speed; unsupported values fall back to 115200 at open.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Line terminator, e.g. `b"\n"`.
    pub fn delimiter(mut self, delimiter: impl Into<Vec<u8>>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Idle deadline for reads; `None` waits until data or close.
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Path of the device node.
    pub fn device_path(&self) -> &Path {
        &self.device
    }
}
