use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("event sink closed")]
    Closed,

    #[error("event sink write failed")]
    Write(#[source] std::io::Error),

    #[error("event encode error")]
    Encode(#[source] serde_json::Error),
}
