use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use tokio::time::Instant;
use toolrun_core::api::{
    Args, ChannelSink, Context, ErrorKind, Event, EventStream, FailureKind, FieldType,
    ObjectSchema, Operation, OperationError, RetryPolicy, Runner, Schema, TimeoutPolicy,
};

type Script = fn(u32) -> EventStream<'static>;

/// Plays `script(attempt)` on each call.
struct Scripted {
    name: &'static str,
    script: Script,
    calls: AtomicU32,
    input: Option<ObjectSchema>,
}

impl Scripted {
    fn new(name: &'static str, script: Script) -> Self {
        Self {
            name,
            script,
            calls: AtomicU32::new(0),
            input: None,
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Operation for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn input_schema(&self) -> Option<&dyn Schema> {
        self.input.as_ref().map(|s| s as &dyn Schema)
    }

    fn run_stream<'a>(&'a self, _args: Args, _ctx: &'a Context) -> EventStream<'a> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        (self.script)(attempt)
    }
}

fn always_fails(_attempt: u32) -> EventStream<'static> {
    Box::pin(async_stream::stream! {
        yield Err(OperationError::failed("upstream unavailable"));
    })
}

fn progress_then_hang(_attempt: u32) -> EventStream<'static> {
    Box::pin(async_stream::stream! {
        tokio::time::sleep(Duration::from_secs(2)).await;
        yield Ok(Event::progress("connected"));
        std::future::pending::<()>().await;
    })
}

fn fails_once_then_ends(attempt: u32) -> EventStream<'static> {
    Box::pin(async_stream::stream! {
        if attempt == 1 {
            yield Ok(Event::error("transient"));
        } else {
            yield Ok(Event::stdout("ok"));
            let mut obs = Map::new();
            obs.insert("answer".into(), json!(42));
            yield Ok(Event::end(None, obs));
        }
    })
}

fn never_called(_attempt: u32) -> EventStream<'static> {
    Box::pin(futures::stream::empty())
}

#[tokio::test(start_paused = true)]
async fn runtime_failures_retry_with_doubling_backoff() {
    let mut runner = Runner::new(
        RetryPolicy::new(
            3,
            100,
            2.0,
            0,
            [FailureKind::TimeoutError, FailureKind::RuntimeError],
        )
        .unwrap(),
        TimeoutPolicy::default(),
    );
    let op = Scripted::new("fetch", always_fails);
    let (sink, mut rx) = ChannelSink::channel();

    let started = Instant::now();
    let result = runner.run(&op, Args::new(), &Context::new(), &sink).await;

    assert_eq!(started.elapsed(), Duration::from_millis(300));
    assert_eq!(op.calls(), 3);
    let err = result.error().unwrap();
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert_eq!(err.attempts, Some(3));
    assert_eq!(err.max_attempts, Some(3));
    assert!(result.analysis_complete());

    drop(sink);
    let mut starts = Vec::new();
    while let Some(ev) = rx.recv().await {
        if ev["type"] == json!("tool.start") {
            starts.push(ev["payload"]["attempt"].clone());
        }
    }
    assert_eq!(starts, vec![json!(1), json!(2), json!(3)]);
}

#[tokio::test(start_paused = true)]
async fn idle_timeout_fires_well_before_hard_ceiling() {
    let mut runner = Runner::new(
        RetryPolicy::no_retry(),
        TimeoutPolicy::new(5, 10, 30).unwrap(),
    );
    let op = Scripted::new("slow", progress_then_hang);

    let started = Instant::now();
    let result = runner
        .run(&op, Args::new(), &Context::new(), &toolrun_core::api::NoopSink)
        .await;

    assert_eq!(started.elapsed(), Duration::from_secs(12));
    let err = result.error().unwrap();
    assert_eq!(err.kind, ErrorKind::TimeoutError);
    assert!(err.message.starts_with("idle timeout"), "{}", err.message);
}

#[tokio::test(start_paused = true)]
async fn repeated_missing_field_escalates_on_second_call() {
    let mut runner = Runner::default().with_max_validation_failures(2);
    let mut op = Scripted::new("lookup", never_called);
    op.input = Some(ObjectSchema::new().required("x", FieldType::Any));
    let ctx = Context::new();
    let sink = toolrun_core::api::NoopSink;

    let first = runner.run(&op, Args::new(), &ctx, &sink).await;
    assert_eq!(first.error_kind(), Some(ErrorKind::ValidationError));
    assert!(!first.analysis_complete());
    assert_eq!(first.error().unwrap().details[0].loc, "x");

    let second = runner.run(&op, Args::new(), &ctx, &sink).await;
    assert_eq!(second.error_kind(), Some(ErrorKind::RepeatedValidationError));
    assert!(second.analysis_complete());

    let third = runner.run(&op, Args::new(), &ctx, &sink).await;
    assert_eq!(third.error_kind(), Some(ErrorKind::RepeatedValidationError));
    assert_eq!(op.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn sink_sees_every_attempt_in_order() {
    let mut runner = Runner::new(
        RetryPolicy::new(3, 10, 1.0, 0, [FailureKind::RuntimeError]).unwrap(),
        TimeoutPolicy::default(),
    );
    let op = Scripted::new("flaky", fails_once_then_ends);
    let (sink, mut rx) = ChannelSink::channel();

    let result = runner.run(&op, Args::new(), &Context::new(), &sink).await;
    assert!(result.is_success());
    assert_eq!(result.to_value(), json!({"observation": {"answer": 42}, "output": null}));

    drop(sink);
    let mut types = Vec::new();
    while let Some(ev) = rx.recv().await {
        types.push(ev["type"].as_str().unwrap_or_default().to_string());
    }
    assert_eq!(
        types,
        vec!["tool.start", "tool.error", "tool.start", "tool.stdout", "tool.end"]
    );
}

#[tokio::test(start_paused = true)]
async fn failure_result_serializes_for_an_agent_loop() {
    let mut runner = Runner::new(
        RetryPolicy::new(1, 0, 1.0, 0, [FailureKind::RuntimeError]).unwrap(),
        TimeoutPolicy::default(),
    );
    let op = Scripted::new("fetch", always_fails);
    let value: Value = runner
        .run(&op, Args::new(), &Context::new(), &toolrun_core::api::NoopSink)
        .await
        .to_value();

    assert_eq!(value["error"]["type"], json!("runtime_error"));
    assert_eq!(value["error"]["message"], json!("upstream unavailable"));
    assert_eq!(value["analysis_complete"], json!(true));
    assert!(value["final_answer"].as_str().unwrap().contains("fetch"));
    assert!(value["summary"].as_str().is_some());
}
