use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{CheckError, Result};

fn prepare_log_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        CheckError::Config(format!(
            "Failed to create log directory '{}': {}",
            dir.display(),
            e
        ))
    })
}

/// Initializes console logging on stderr, plus JSON file logs when a log
/// directory is configured. Hold the returned guard until exit so file logs
/// are flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    // stdout carries the report
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            prepare_log_dir(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "rail_terms.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().json().with_writer(non_blocking_writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(guard)
}
