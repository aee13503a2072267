//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_LINES";

/// Config file name in the current directory
const LOCAL_FILE_NAME: &str = "serial-lines.toml";

/// Config file name inside the per-user config directory
const USER_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_LINES_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using the standard resolution order, apply
    /// environment overrides and validate the result.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file, no overrides).
    pub fn with_defaults() -> Self {
        Self {
            config_path: None,
            config: Config::default(),
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(LOCAL_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Per-user config directory
    get_default_config_path().filter(|path| path.exists())
}

/// Get the per-user config file path, whether or not it exists.
pub fn get_default_config_path() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .map(|dir| dir.join("serial-lines").join(USER_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(write_err)
}

/// Apply `SERIAL_LINES_*` environment overrides to the configuration.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    let var = |key: &str| std::env::var(format!("{ENV_PREFIX}_{key}")).ok();

    if let Some(val) = var("SERIAL_DEVICE") {
        config.serial.device = val;
    }
    if let Some(val) = var("SERIAL_BAUD_RATE") {
        config.serial.baud_rate = val.trim().parse().map_err(|_| {
            ConfigError::env(format!("{ENV_PREFIX}_SERIAL_BAUD_RATE"), "invalid baud rate")
        })?;
    }
    if let Some(val) = var("SERIAL_DELIMITER") {
        config.serial.delimiter = unescape(&val);
    }
    if let Some(val) = var("SERIAL_READ_TIMEOUT_MS") {
        config.serial.read_timeout_ms = match val.trim() {
            "" | "none" => None,
            ms => Some(ms.parse().map_err(|_| {
                ConfigError::env(format!("{ENV_PREFIX}_SERIAL_READ_TIMEOUT_MS"), "invalid timeout")
            })?),
        };
    }
    if let Some(val) = var("LOG_LEVEL") {
        config.logging.level = val;
    }

    Ok(())
}

/// Expand `\r`, `\n`, `\t` and `\\` escapes, as typed on a shell command line.
///
/// Unknown escapes are kept verbatim.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.baud_rate, 115200);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("SERIAL_LINES_SERIAL_DEVICE", "/dev/ttyACM7");
        env::set_var("SERIAL_LINES_SERIAL_DELIMITER", "\\n");
        env::set_var("SERIAL_LINES_SERIAL_READ_TIMEOUT_MS", "75");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);

        env::remove_var("SERIAL_LINES_SERIAL_DEVICE");
        env::remove_var("SERIAL_LINES_SERIAL_DELIMITER");
        env::remove_var("SERIAL_LINES_SERIAL_READ_TIMEOUT_MS");

        result.expect("overrides apply");
        assert_eq!(config.serial.device, "/dev/ttyACM7");
        assert_eq!(config.serial.delimiter, "\n");
        assert_eq!(config.serial.read_timeout_ms, Some(75));
    }

    #[test]
    #[serial]
    fn test_bad_env_override_is_reported() {
        env::set_var("SERIAL_LINES_SERIAL_BAUD_RATE", "fast");
        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        env::remove_var("SERIAL_LINES_SERIAL_BAUD_RATE");

        assert!(matches!(result, Err(ConfigError::Env { .. })));
    }

    #[test]
    #[serial]
    fn test_load_and_save_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("serial-lines.toml");

        let mut loader = ConfigLoader::with_defaults();
        loader.config_mut().serial.device = "/dev/ttyUSB3".to_string();
        loader.config_mut().serial.baud_rate = 230400;
        loader.save_to(&path).expect("save");

        let reloaded = ConfigLoader::load_from(&path).expect("load");
        assert_eq!(reloaded.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(reloaded.config(), loader.config());
    }

    #[test]
    #[serial]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("serial-lines.toml");
        std::fs::write(&path, "[serial]\nbaud_rate = 12345\n").expect("write");

        let err = ConfigLoader::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "serial.baud_rate", .. }));

        std::fs::write(&path, "[serial\n").expect("write");
        assert!(matches!(
            ConfigLoader::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_missing_named_file_is_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");

        match ConfigLoader::load_from(&path) {
            Err(ConfigError::Read { path: reported, source }) => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Read error, got: {other:?}"),
        }
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("\\r\\n"), "\r\n");
        assert_eq!(unescape("a\\tb"), "a\tb");
        assert_eq!(unescape("\\\\"), "\\");
        assert_eq!(unescape("\\x"), "\\x");
        assert_eq!(unescape("end\\"), "end\\");
        assert_eq!(unescape("plain"), "plain");
    }
}
