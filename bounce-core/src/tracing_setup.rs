//! Tracing setup for Bounce
//!
//! Console output at a user-chosen level, optionally mirrored into a log file
//! that captures everything down to `trace`.

use std::fs::{File, create_dir_all};
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Initialize tracing with console output and an optional debug log file.
///
/// `RUST_LOG` overrides `console_level` when set. The log file, if given, is
/// truncated and receives every event regardless of the console filter.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - If the log file cannot be created or a global
///   subscriber is already installed
pub fn init_tracing(
    console_level: Level,
    log_file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new("trace")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        console = %console_level,
        log_file = ?log_file.map(Path::display),
        "Tracing initialized"
    );

    Ok(())
}

/// CLI log levels for user control
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Debug, informational, warning, and error messages
    Debug,
    /// All messages including per-frame tracing
    Trace,
}

impl CliLogLevel {
    /// Converts CLI log level to tracing Level enum.
    ///
    /// # Examples
    /// ```
    /// use bounce_core::tracing_setup::CliLogLevel;
    ///
    /// let level = CliLogLevel::Info.as_tracing_level();
    /// assert_eq!(level, tracing::Level::INFO);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::ValueEnum;

    use super::*;

    #[test]
    fn test_log_level_parsing_is_case_insensitive() {
        assert_eq!(CliLogLevel::from_str("WARN", true), Ok(CliLogLevel::Warn));
        assert_eq!(CliLogLevel::from_str("trace", true), Ok(CliLogLevel::Trace));
        assert!(CliLogLevel::from_str("loud", true).is_err());
    }

    #[test]
    fn test_every_level_maps_to_tracing() {
        let levels: Vec<Level> = CliLogLevel::value_variants()
            .iter()
            .map(|level| level.as_tracing_level())
            .collect();
        assert_eq!(
            levels,
            vec![Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE]
        );
    }
}
