//! Logging setup for cdbtile binaries.
//!
//! Writes structured logs to a file (truncated at startup) and to stdout.
//! The level defaults to `info` and can be overridden with `RUST_LOG`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to prepare log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A global subscriber was already installed
    #[error("Failed to install log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Keeps the background log writer alive.
///
/// Dropping it flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    path: PathBuf,
}

impl LoggingGuard {
    /// The log file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Installs the global subscriber.
///
/// # Arguments
///
/// * `log_dir` - Directory for the log file, created if missing
/// * `log_file` - Log file name
/// * `stdout` - Also print to stdout
///
/// # Returns
///
/// A guard that must be held for as long as logging is needed.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    stdout: bool,
) -> Result<LoggingGuard, LoggingError> {
    let path = prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_target(false)
            .compact()
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path,
    })
}

/// Creates `log_dir` and empties the previous log.
fn prepare_log_file(log_dir: &Path, log_file: &str) -> Result<PathBuf, LoggingError> {
    let path = log_dir.join(log_file);
    let io_err = |source| LoggingError::Io {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(log_dir).map_err(io_err)?;
    fs::write(&path, "").map_err(io_err)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_creates_directory_and_truncates() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("logs");

        let path = prepare_log_file(&dir, "cdbtile.log").unwrap();
        assert!(path.exists());

        fs::write(&path, "old session").unwrap();
        prepare_log_file(&dir, "cdbtile.log").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_prepare_fails_when_directory_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let err = prepare_log_file(&blocker, "cdbtile.log").unwrap_err();
        assert!(matches!(err, LoggingError::Io { .. }));
    }

    #[test]
    fn test_init_writes_to_file() {
        let temp = TempDir::new().unwrap();
        let guard = init_logging(temp.path(), "test.log", false).unwrap();
        assert_eq!(guard.path(), temp.path().join("test.log"));

        tracing::info!("logging initialized");
        drop(guard);

        let text = fs::read_to_string(temp.path().join("test.log")).unwrap();
        assert!(text.contains("logging initialized"));
    }
}
