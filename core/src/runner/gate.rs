use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;

use crate::error::OperationError;
use crate::operation::EventStream;
use crate::policy::TimeoutPolicy;
use crate::tool_event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    WaitingFirst,
    Streaming,
    Ended,
    TimedOut,
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("idle timeout: no first event within {}s", .0.as_secs_f64())]
    FirstEvent(Duration),

    #[error("idle timeout: no event within {}s", .0.as_secs_f64())]
    Idle(Duration),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Enforces the first-event and idle windows on an operation's stream.
///
/// Every call to [`StreamGate::next`] races one pending receive against one
/// fresh timer; whichever loses is dropped before the call returns, so no
/// wait outlives its iteration.
pub struct StreamGate<'a> {
    inner: EventStream<'a>,
    start: Duration,
    idle: Duration,
    state: GateState,
}

impl<'a> StreamGate<'a> {
    pub fn new(inner: EventStream<'a>, timeouts: &TimeoutPolicy) -> Self {
        Self::with_windows(inner, timeouts.start_timeout(), timeouts.idle_timeout())
    }

    pub fn with_windows(inner: EventStream<'a>, start: Duration, idle: Duration) -> Self {
        Self {
            inner,
            start,
            idle,
            state: GateState::WaitingFirst,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Next event, `Ok(None)` once the stream has ended.
    ///
    /// After a timeout or a stream failure the gate is closed and keeps
    /// returning `Ok(None)`.
    pub async fn next(&mut self) -> Result<Option<Event>, GateError> {
        let window = match self.state {
            GateState::WaitingFirst => self.start,
            GateState::Streaming => self.idle,
            GateState::Ended | GateState::TimedOut => return Ok(None),
        };

        match tokio::time::timeout(window, self.inner.next()).await {
            Ok(Some(Ok(event))) => {
                self.state = GateState::Streaming;
                Ok(Some(event))
            }
            Ok(Some(Err(e))) => {
                self.state = GateState::Ended;
                Err(GateError::Operation(e))
            }
            Ok(None) => {
                self.state = GateState::Ended;
                Ok(None)
            }
            Err(_elapsed) => {
                let first = self.state == GateState::WaitingFirst;
                self.state = GateState::TimedOut;
                tracing::debug!(
                    target: "toolrun.gate",
                    first_event = first,
                    window_ms = window.as_millis() as u64,
                    "stream gate timed out"
                );
                if first {
                    Err(GateError::FirstEvent(window))
                } else {
                    Err(GateError::Idle(window))
                }
            }
        }
    }
}
