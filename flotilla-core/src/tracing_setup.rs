//! Tracing setup for the addon binary.
//!
//! The console shows the operator-facing level with noisy HTTP internals held
//! at warn. The log file records every Flotilla event plus one close event per
//! span, so each `aggregate` span leaves its `request_id`, media and total
//! busy/idle time behind, next to the per-provider events it contained.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// File name of the per-run debug log inside the logs directory.
pub const LOG_FILE_NAME: &str = "flotilla-last-run.log";

/// Filter for the log file: provider fan-out at trace, the rest of the addon
/// at debug, dependencies at info.
pub const FILE_DIRECTIVES: &str =
    "info,flotilla_search=trace,flotilla_core=debug,flotilla_web=debug,flotilla=debug,tower_http=debug";

const QUIET_DEPENDENCIES: [&str; 4] = ["hyper", "hyper_util", "reqwest", "h2"];

/// Console filter for `level`, keeping HTTP client and server internals at warn.
pub fn console_directives(level: Level) -> String {
    let level = level.to_string().to_lowercase();
    QUIET_DEPENDENCIES
        .iter()
        .fold(level, |directives, target| format!("{directives},{target}=warn"))
}

/// Installs the console and file layers as the global subscriber.
///
/// `RUST_LOG` overrides the console filter. The file is
/// `<logs_dir>/flotilla-last-run.log` (default `./logs`), truncated each run.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - The logs directory or file cannot be
///   created, or a global subscriber is already installed
pub fn init_tracing(
    console_level: Level,
    logs_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_file_path = prepare_log_file(logs_dir)?;
    let log_file = File::create(&log_file_path)?;

    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(console_directives(console_level))?,
    };

    let console_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::try_new(FILE_DIRECTIVES)?);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        console = %console_level,
        log_file = %log_file_path.display(),
        "Tracing initialized"
    );

    Ok(())
}

/// Creates the logs directory and returns the log file path inside it.
///
/// # Errors
///
/// - `std::io::Error` - If the directory cannot be created
pub fn prepare_log_file(logs_dir: Option<&Path>) -> std::io::Result<PathBuf> {
    let logs_path = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(logs_path)?;
    Ok(logs_path.join(LOG_FILE_NAME))
}

/// Console log level accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Errors only
    Error,
    /// Provider failures and above
    Warn,
    /// One line per aggregation and above
    Info,
    /// Per-provider settlement
    Debug,
    /// Everything
    Trace,
}

impl CliLogLevel {
    /// The matching `tracing` level.
    ///
    /// ```
    /// use flotilla_core::tracing_setup::CliLogLevel;
    ///
    /// assert_eq!(CliLogLevel::Warn.as_tracing_level(), tracing::Level::WARN);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_log_file_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let logs_dir = temp.path().join("nested").join("logs");

        let path = prepare_log_file(Some(&logs_dir)).unwrap();

        assert!(logs_dir.is_dir());
        assert_eq!(path, logs_dir.join(LOG_FILE_NAME));
    }

    #[test]
    fn test_console_directives_quiet_http_internals() {
        let directives = console_directives(Level::DEBUG);

        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("hyper=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_file_directives_target_crate_modules() {
        assert!(EnvFilter::try_new(FILE_DIRECTIVES).is_ok());
        assert!(FILE_DIRECTIVES.contains("flotilla_search=trace"));
    }
}
