//! Error types for the line reader.
//!
//! Construction, loop and write failures each get their own variant so callers
//! can tell a device that never opened apart from one that went away mid-stream.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors produced by [`LineReader`](crate::LineReader).
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The device node could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the terminal attribute block failed.
    #[error("failed to read terminal attributes: {0}")]
    GetAttributes(#[source] io::Error),

    /// Committing the raw-mode attribute block failed.
    #[error("failed to apply terminal attributes: {0}")]
    SetAttributes(#[source] io::Error),

    /// Switching the descriptor back to blocking mode failed.
    #[error("failed to restore blocking mode: {0}")]
    BlockingMode(#[source] io::Error),

    /// The wakeup pipe could not be allocated.
    #[error("failed to create wakeup signal: {0}")]
    WakeupCreate(#[source] io::Error),

    /// The readiness wait itself failed.
    #[error("readiness wait failed: {0}")]
    Wait(#[source] io::Error),

    /// Reading from the device failed.
    #[error("device read failed: {0}")]
    Read(#[source] io::Error),

    /// The device reported end-of-file, usually because the peer hung up.
    #[error("device disconnected")]
    Disconnected,

    /// No data and no wakeup arrived within the configured read timeout.
    #[error("no data received within {0:?}")]
    Timeout(Duration),

    /// The reader was closed before or during the operation.
    #[error("reader is closed")]
    Closed,

    /// Another read loop is already running on this reader.
    #[error("another read loop is already active on this reader")]
    Busy,

    /// Writing to the device failed.
    #[error("device write failed: {0}")]
    Write(#[source] io::Error),

    /// Releasing the device descriptor failed.
    #[error("failed to close device: {0}")]
    Close(#[source] io::Error),

    /// The configuration was rejected before any resource was acquired.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ReaderError {
    /// Create an `InvalidConfig` error from a message.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether this error is the closed-state signal rather than a device fault.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
