//! Configuration schema definitions.
//!
//! Every section uses `#[serde(default)]`, so a file only needs the keys it
//! changes.

use super::error::{ConfigError, ConfigResult};
use crate::port::{BaudRate, ReaderConfig, DEFAULT_BAUD_RATE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device and framing settings
    pub serial: SerialSection,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the reader cannot honour.
    ///
    /// Unlike [`LineReader::open`](crate::LineReader::open), which falls back
    /// to 115200 for an unknown baud rate, a config file naming one is an error.
    pub fn validate(&self) -> ConfigResult<()> {
        let serial = &self.serial;
        if serial.device.trim().is_empty() {
            return Err(ConfigError::invalid("serial.device", "must not be empty"));
        }
        if serial.delimiter.is_empty() {
            return Err(ConfigError::invalid("serial.delimiter", "must not be empty"));
        }
        BaudRate::try_from(serial.baud_rate)
            .map_err(|e| ConfigError::invalid("serial.baud_rate", e.to_string()))?;
        Ok(())
    }
}

/// `[serial]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSection {
    /// Character device path
    pub device: String,
    /// Line speed in bits per second
    pub baud_rate: u32,
    /// Line delimiter; TOML escapes such as "\r\n" apply
    pub delimiter: String,
    /// Idle read timeout in milliseconds; absent means wait forever
    pub read_timeout_ms: Option<u64>,
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            delimiter: "\r\n".to_string(),
            read_timeout_ms: None,
        }
    }
}

impl SerialSection {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Build the reader configuration this section describes.
    pub fn to_reader_config(&self) -> ReaderConfig {
        ReaderConfig::new(&self.device)
            .baud_rate(self.baud_rate)
            .delimiter(self.delimiter.as_bytes())
            .read_timeout(self.read_timeout())
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset: "trace" .. "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    Pretty,
    /// Compact format
    #[default]
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.serial.delimiter, "\r\n");
        assert_eq!(config.logging.format, LogFormat::Compact);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            device = "/dev/ttyACM1"
            baud_rate = 9600
            delimiter = "\n"
            read_timeout_ms = 250

            [logging]
            format = "json"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.device, "/dev/ttyACM1");
        assert_eq!(config.serial.delimiter, "\n");
        assert_eq!(config.serial.read_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.logging.format, LogFormat::Json);
        // Defaults should still work
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_to_reader_config() {
        let section = SerialSection {
            device: "/dev/ttyS0".to_string(),
            baud_rate: 57600,
            delimiter: "\n".to_string(),
            read_timeout_ms: Some(100),
        };
        let reader = section.to_reader_config();
        assert_eq!(reader.device_path(), std::path::Path::new("/dev/ttyS0"));
        assert_eq!(reader.baud_rate, 57600);
        assert_eq!(reader.delimiter, b"\n");
        assert_eq!(reader.read_timeout, Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.serial.baud_rate = 4800;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("serial.baud_rate"));

        let mut config = Config::default();
        config.serial.delimiter.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "serial.delimiter", .. })
        ));

        let mut config = Config::default();
        config.serial.device = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
