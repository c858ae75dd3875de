use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toolrun_core::api::LoggingConfig;

use crate::error::CliError;

/// Logs go to stderr, plus a daily file when `logging.directory` is set.
/// `RUST_LOG` wins over `logging.level`. Keep the guard alive until exit.
pub fn init_logging(cfg: &LoggingConfig) -> Result<Option<WorkerGuard>, CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .map_err(|e| CliError::Logging(e.to_string()))?;

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let (file_layer, guard) = match &cfg.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, &cfg.file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;

    Ok(guard)
}
