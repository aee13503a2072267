//! Serial Lines Library
//!
//! Low-latency, cancellable, line-oriented access to a POSIX serial device,
//! aimed at high-frequency instrument telemetry where buffering delays and
//! shutdowns that hang on a silent device are both unacceptable.
//!
//! # Modules
//!
//! - `reader`: the [`LineReader`] with its one-shot and continuous read loops
//! - `port`: raw TTY configuration, baud table, wakeup pipe and readiness wait
//! - `framing`: delimiter-based [`LineFramer`]
//! - `error`: [`ReaderError`] and the crate `Result`
//! - `config`: TOML configuration with environment overrides (used by the CLI)
//! - `logging`: `tracing-subscriber` setup driven by [`LoggingConfig`]
//!
//! Only Unix-like systems are supported.

#[cfg(not(unix))]
compile_error!("serial_lines requires a POSIX terminal interface");

pub mod config;
pub mod error;
pub mod framing;
pub mod logging;
pub mod port;
pub mod reader;

pub use error::{ReaderError, Result};
pub use framing::LineFramer;
pub use port::{BaudRate, ReaderConfig, UnsupportedBaudRate, DEFAULT_BAUD_RATE, DEFAULT_DELIMITER};
pub use reader::LineReader;

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult, LogFormat, LoggingConfig};
