//! Logging setup for trailmap binaries.
//!
//! Log records go to two places:
//! - the log file named in `[logging] file` (truncated at startup)
//! - stderr, so `trailmap probe --json` keeps stdout clean
//!
//! The level is taken from `RUST_LOG` and defaults to `info`.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter directive when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global tracing subscriber.
///
/// Creates the parent directory of `log_file` if needed and clears any
/// previous contents.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the log file cannot
/// be cleared, or a global subscriber is already installed.
pub fn init_logging(log_file: &Path) -> Result<LoggingGuard, io::Error> {
    let (dir, name) = prepare_log_file(log_file)?;

    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Create the log directory and truncate the file, returning its parts.
fn prepare_log_file(log_file: &Path) -> Result<(&Path, &std::ffi::OsStr), io::Error> {
    let name = log_file.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path has no file name: {}", log_file.display()),
        )
    })?;
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(dir)?;
    fs::write(log_file, "")?;
    Ok((dir, name))
}
