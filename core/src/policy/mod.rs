//! Immutable execution policies consumed by the runner.

mod kind;
mod retry;
mod timeout;

pub use kind::{ErrorKind, FailureKind};
pub use retry::{
    Backoff, RetryPolicy, DEFAULT_BACKOFF_MS, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_JITTER_MS,
    DEFAULT_MAX_ATTEMPTS,
};
pub use timeout::{
    TimeoutPolicy, DEFAULT_HARD_TIMEOUT_S, DEFAULT_IDLE_TIMEOUT_S, DEFAULT_START_TIMEOUT_S,
};
