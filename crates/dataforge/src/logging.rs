//! Tracing subscriber setup.
//!
//! Console output is filtered by `RUST_LOG` when set, otherwise by
//! `logging.level`. With `logging.file_dir` set, a daily-rotating JSON log
//! is written there as well, at trace level for the Dataforge crates.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use dataforge_config::LoggingConfig;

use crate::error::{OrchestratorError, Result};

/// File name prefix of the rotating log file.
pub const LOG_FILE_PREFIX: &str = "dataforge.log";

const FILE_FILTER: &str =
    "dataforge=trace,dataforge_pipeline=trace,dataforge_plugin=trace,dataforge_config=trace,info";

/// Install the global tracing subscriber.
///
/// Returns the file writer's guard when file logging is enabled; keep it
/// alive for as long as logs should be flushed. Fails if the level is not a
/// valid filter or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (plain, json) = if config.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_filter(console_filter(&config.level)?);
        (None, Some(layer))
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(console_filter(&config.level)?);
        (Some(layer), None)
    };

    let (file, guard) = match &config.file_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(FILE_FILTER));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(plain)
        .with(json)
        .with(file)
        .try_init()
        .map_err(|e| OrchestratorError::Logging(e.to_string()))?;

    Ok(guard)
}

fn console_filter(level: &str) -> Result<EnvFilter> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| level.to_string());
    EnvFilter::try_new(&directives)
        .map_err(|e| OrchestratorError::Logging(format!("invalid filter '{directives}': {e}")))
}
