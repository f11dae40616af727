use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use types::errors::PayError;

/// Installs the global subscriber: console output, plus a daily rolling
/// `paylink.log` under `log_dir` when one is given. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_logging(log_dir: Option<&Path>) -> Result<(), PayError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(log_dir) = log_dir {
        if !log_dir.exists() {
            std::fs::create_dir_all(log_dir).map_err(|e| {
                PayError::Config(format!(
                    "Failed to create log directory {}: {e}",
                    log_dir.display()
                ))
            })?;
        }

        let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "paylink.log");

        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true);

        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        registry
            .with(file_layer)
            .with(console_layer)
            .try_init()
            .map_err(|e| PayError::Config(format!("Failed to initialize logging: {e}")))?;
        tracing::info!(
            "Logging initialized with file output: {}",
            log_dir.display()
        );
    } else {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        registry
            .with(console_layer)
            .try_init()
            .map_err(|e| PayError::Config(format!("Failed to initialize logging: {e}")))?;
        tracing::debug!("Logging initialized with console output only");
    }

    Ok(())
}
