//! Configuration module for the `serial-lines` tool.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_LINES_CONFIG` environment variable (explicit path)
//! 2. `./serial-lines.toml` (current directory)
//! 3. `$XDG_CONFIG_HOME/serial-lines/config.toml` (or `~/.config/serial-lines/config.toml`)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `SERIAL_LINES_SERIAL_DEVICE=/dev/ttyACM0`
//! - `SERIAL_LINES_SERIAL_BAUD_RATE=57600`
//! - `SERIAL_LINES_SERIAL_DELIMITER=\n` (`\r`, `\n`, `\t`, `\\` escapes are understood)
//! - `SERIAL_LINES_SERIAL_READ_TIMEOUT_MS=500`
//! - `SERIAL_LINES_LOG_LEVEL=debug`
//!
//! # Example file
//!
//! ```toml
//! [serial]
//! device = "/dev/ttyUSB0"
//! baud_rate = 115200
//! delimiter = "\r\n"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, unescape, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, SerialSection};
