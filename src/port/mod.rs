//! Device-level plumbing: raw TTY configuration, the wakeup pipe and the
//! two-source readiness wait the reader blocks on.

pub mod baud;
pub(crate) mod poll;
pub mod settings;
pub(crate) mod tty;
pub(crate) mod wakeup;

pub use baud::{BaudRate, UnsupportedBaudRate};
pub use settings::{ReaderConfig, DEFAULT_BAUD_RATE, DEFAULT_DELIMITER};
