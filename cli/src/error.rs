use thiserror::Error;
use toolrun_core::api::{ConfigError, SinkError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("events_out could not be started")]
    EventsOut(#[from] SinkError),

    #[error("no operation configured; pass --replay or --program, or add an [operation] section")]
    NoOperation,

    #[error("operation setup failed")]
    Operation(#[source] anyhow::Error),

    #[error("--{flag} must be a JSON object")]
    InvalidJson {
        flag: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("could not render config")]
    Render(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
