use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::SinkError;
use crate::operation::{Args, Context, Operation};
use crate::policy::{FailureKind, TimeoutPolicy};
use crate::tool_event::Event;

use super::gate::{GateError, StreamGate};
use super::sink::EventSink;

/// How an attempt's stream finished when it did finish.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    Ended {
        output: Option<Map<String, Value>>,
        observation: Map<String, Value>,
    },
    /// The operation reported its own failure through an `Error` event.
    Errored { message: String },
    /// Closed without `Error` or `End`.
    Empty,
}

#[derive(Debug, Error)]
pub(crate) enum AttemptError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("hard timeout: attempt exceeded {}s", .0.as_secs_f64())]
    HardTimeout(Duration),

    #[error("{0}")]
    Reported(String),

    #[error("event sink failed: {0}")]
    Sink(#[from] SinkError),
}

impl AttemptError {
    pub(crate) fn kind(&self) -> FailureKind {
        match self {
            AttemptError::Gate(GateError::FirstEvent(_) | GateError::Idle(_))
            | AttemptError::HardTimeout(_) => FailureKind::TimeoutError,
            AttemptError::Gate(GateError::Operation(_))
            | AttemptError::Reported(_)
            | AttemptError::Sink(_) => FailureKind::RuntimeError,
        }
    }
}

/// Runs one attempt: emits `Start`, then races the gated stream against the
/// hard ceiling. Whichever side loses is dropped with the attempt.
pub(crate) async fn run_attempt(
    op: &dyn Operation,
    args: Args,
    ctx: &Context,
    sink: &dyn EventSink,
    timeouts: &TimeoutPolicy,
    attempt: u32,
) -> Result<AttemptOutcome, AttemptError> {
    sink.emit(Event::Start { attempt }.to_wire()).await?;

    let hard = timeouts.effective_hard_timeout();
    match tokio::time::timeout(hard, consume(op, args, ctx, sink, timeouts)).await {
        Ok(outcome) => outcome,
        Err(_elapsed) => Err(AttemptError::HardTimeout(hard)),
    }
}

async fn consume(
    op: &dyn Operation,
    args: Args,
    ctx: &Context,
    sink: &dyn EventSink,
    timeouts: &TimeoutPolicy,
) -> Result<AttemptOutcome, AttemptError> {
    let mut gate = StreamGate::new(op.run_stream(args, ctx), timeouts);
    while let Some(event) = gate.next().await? {
        sink.emit(event.to_wire()).await?;
        match event {
            Event::Error { message } => return Ok(AttemptOutcome::Errored { message }),
            Event::End {
                output,
                observation,
            } => {
                return Ok(AttemptOutcome::Ended {
                    output,
                    observation,
                })
            }
            _ => {}
        }
    }
    Ok(AttemptOutcome::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::sink::ChannelSink;
    use crate::test_support::{ScriptedOperation, Step};
    use serde_json::json;
    use tokio::time::Instant;

    fn timeouts(start: u64, idle: u64, hard: u64) -> TimeoutPolicy {
        TimeoutPolicy::new(start, idle, hard).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn start_precedes_forwarded_events() {
        let op = ScriptedOperation::repeating(
            "echo",
            vec![
                Step::now(Event::stdout("hi")),
                Step::now(Event::end(None, Map::new())),
            ],
        );
        let (sink, mut rx) = ChannelSink::channel();
        let outcome = run_attempt(&op, Args::new(), &Context::new(), &sink, &timeouts(5, 10, 30), 4)
            .await
            .unwrap();
        assert!(matches!(outcome, AttemptOutcome::Ended { output: None, .. }));
        assert_eq!(
            rx.recv().await.unwrap(),
            json!({"type": "tool.start", "payload": {"attempt": 4}})
        );
        assert_eq!(rx.recv().await.unwrap()["type"], json!("tool.stdout"));
        assert_eq!(rx.recv().await.unwrap()["type"], json!("tool.end"));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_consuming_after_error_event() {
        let op = ScriptedOperation::repeating(
            "failing",
            vec![
                Step::now(Event::error("bad gateway")),
                Step::now(Event::stdout("after")),
            ],
        );
        let (sink, mut rx) = ChannelSink::channel();
        let outcome = run_attempt(&op, Args::new(), &Context::new(), &sink, &timeouts(5, 10, 30), 1)
            .await
            .unwrap();
        assert!(matches!(outcome, AttemptOutcome::Errored { ref message } if message == "bad gateway"));
        drop(sink);
        let mut types = Vec::new();
        while let Some(v) = rx.recv().await {
            types.push(v["type"].as_str().unwrap().to_string());
        }
        assert_eq!(types, vec!["tool.start", "tool.error"]);
    }

    #[tokio::test(start_paused = true)]
    async fn hard_ceiling_cuts_a_chatty_stream() {
        // One event every 4s never trips the idle window but runs past the ceiling.
        let steps: Vec<Step> = (0..100).map(|_| Step::Emit(4_000, Event::progress("tick"))).collect();
        let op = ScriptedOperation::repeating("chatty", steps);
        let started = Instant::now();
        let err = run_attempt(
            &op,
            Args::new(),
            &Context::new(),
            &crate::runner::NoopSink,
            &timeouts(5, 5, 30),
            1,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AttemptError::HardTimeout(d) if d == Duration::from_secs(30)));
        assert_eq!(err.kind(), FailureKind::TimeoutError);
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_sink_is_a_runtime_failure() {
        let op = ScriptedOperation::repeating("x", vec![Step::now(Event::progress("a"))]);
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        let err = run_attempt(&op, Args::new(), &Context::new(), &sink, &timeouts(5, 10, 30), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptError::Sink(SinkError::Closed)));
        assert_eq!(err.kind(), FailureKind::RuntimeError);
        assert_eq!(op.calls(), 0);
    }

    #[test]
    fn classification() {
        assert_eq!(
            AttemptError::Gate(GateError::Idle(Duration::from_secs(1))).kind(),
            FailureKind::TimeoutError
        );
        assert_eq!(
            AttemptError::Reported("x".into()).kind(),
            FailureKind::RuntimeError
        );
        assert_eq!(
            AttemptError::Gate(GateError::Operation(crate::error::OperationError::failed("x"))).kind(),
            FailureKind::RuntimeError
        );
    }
}
