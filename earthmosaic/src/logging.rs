//! Logging setup.
//!
//! Mapping runs take hours at one request per second or two, so logs go both
//! to a file that survives the session and to stdout for watching progress.
//! The level is `info` unless `RUST_LOG` says otherwise.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the file writer alive; logs are flushed when it is dropped.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Installs the global subscriber writing to `log_dir/log_file` and stdout.
///
/// The log file is truncated at start. If a global subscriber is already set
/// (for example by a test harness) the existing one is kept.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// truncated.
pub fn init_logging(log_dir: &Path, log_file: &str) -> io::Result<LoggingGuard> {
    let (non_blocking_file, file_guard) = file_writer(log_dir, log_file)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init in the same process is not an error
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Truncates the log file and opens a background writer onto it.
fn file_writer(log_dir: &Path, log_file: &str) -> io::Result<(NonBlocking, WorkerGuard)> {
    prepare_log_file(log_dir, log_file)?;
    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    Ok(tracing_appender::non_blocking(file_appender))
}

/// Creates `log_dir` and truncates the log file, returning its path.
fn prepare_log_file(log_dir: &Path, log_file: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(log_file);
    fs::write(&path, "")?;
    Ok(path)
}

/// Default log directory: `<data dir>/earthmosaic/logs`, or `./logs`.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("earthmosaic"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("logs")
}

pub fn default_log_file() -> &'static str {
    "earthmosaic.log"
}
