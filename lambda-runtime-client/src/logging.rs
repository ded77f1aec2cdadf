//! Logging setup for runtime processes.
//!
//! Installs a global `tracing` subscriber that writes to stdout through a
//! non-blocking worker, so log output never stalls the poll loop:
//! - Compact single-line format, no ANSI colors (stdout is captured by the platform)
//! - Filter from `RUST_LOG`, defaulting to `info`

use std::io;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Errors from logging initialization.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A global subscriber was already installed.
    #[error("Failed to install log subscriber: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes any buffered output.
pub struct LoggingGuard {
    _stdout_guard: WorkerGuard,
}

/// Initialize logging with the filter from `RUST_LOG`.
///
/// # Errors
///
/// [`LoggingError::AlreadyInitialized`] if called more than once per process.
pub fn init_logging() -> Result<LoggingGuard, LoggingError> {
    init_logging_with(env_filter())
}

/// Initialize logging with an explicit filter.
pub fn init_logging_with(filter: EnvFilter) -> Result<LoggingGuard, LoggingError> {
    let (writer, stdout_guard) = tracing_appender::non_blocking(io::stdout());

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .try_init()?;

    Ok(LoggingGuard {
        _stdout_guard: stdout_guard,
    })
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
