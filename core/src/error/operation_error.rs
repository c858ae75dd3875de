use thiserror::Error;

/// Failure raised by an operation while its stream is being consumed.
///
/// Anything surfacing through this type is classified as `runtime_error`.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("{0}")]
    Failed(String),

    #[error("io error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid event: {0}")]
    InvalidEvent(#[from] super::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OperationError {
    pub fn failed(message: impl Into<String>) -> Self {
        OperationError::Failed(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        OperationError::Io {
            context: context.into(),
            source,
        }
    }
}
