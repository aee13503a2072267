//! Log subscriber setup for the command-line tool.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the application.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::filter::{EnvFilter, ParseError};
use tracing_subscriber::fmt;
use std::io::IsTerminal;
use tracing_subscriber::prelude::*;

/// Install a global `fmt` subscriber writing to stderr.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`. Returns
/// `Ok(false)` if another subscriber was already installed.
pub fn init(config: &LoggingConfig) -> Result<bool, ParseError> {
    let filter = build_filter(config)?;
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .with_ansi(use_ansi(config.format, std::io::stderr().is_terminal()));

    let installed = match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(layer.pretty().with_filter(filter))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(layer.compact().with_filter(filter))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(layer.json().with_filter(filter))
            .try_init(),
    };

    Ok(installed.is_ok())
}

/// Colour human-readable output only when stderr is a terminal.
fn use_ansi(format: LogFormat, stderr_is_terminal: bool) -> bool {
    stderr_is_terminal && !matches!(format, LogFormat::Json)
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ParseError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.level),
    }
}
