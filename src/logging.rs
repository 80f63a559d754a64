use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Non-blocking writer appending to `log_file`, creating its directory.
///
/// Buffered lines are flushed when the guard drops.
pub fn file_writer(log_file: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = log_file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("Log file {} has no file name", log_file.display()))?;
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global JSON subscriber writing to `log_file`.
///
/// Keep the returned guard alive for as long as the process logs.
pub fn init_logging(log_file: &Path) -> Result<WorkerGuard> {
    let (writer, guard) = file_writer(log_file)?;

    tracing_subscriber::fmt()
        .json()
        .with_writer(writer)
        .with_env_filter(EnvFilter::from_default_env().add_directive("stock_watch=info".parse()?))
        .init();

    Ok(guard)
}
