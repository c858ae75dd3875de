use std::io::Write;

use toolrun_core::api::{Args, Context, ErrorKind, NoopSink, RetryPolicy, Runner, TimeoutPolicy};
use toolrun_core::Operation;
use toolrun_plugins::{CommandOperation, ReplayOperation};

async fn message_of(op: &dyn Operation) -> String {
    let mut runner = Runner::new(RetryPolicy::no_retry(), TimeoutPolicy::default());
    let result = runner.run(op, Args::new(), &Context::new(), &NoopSink).await;
    let err = result.error().unwrap();
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    err.message.clone()
}

#[tokio::test]
async fn bad_replay_line_names_the_parse_failure() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"type":"bogus"}}"#).unwrap();
    let op = ReplayOperation::new("replay", file.path());

    let message = message_of(&op).await;
    assert_eq!(message, "invalid event: unknown event type: bogus");
}

#[tokio::test]
async fn missing_replay_file_keeps_the_os_error() {
    let op = ReplayOperation::new("replay", "/no/such.jsonl");
    let message = message_of(&op).await;
    assert!(message.starts_with("io error in reading /no/such.jsonl: "), "{}", message);
    assert!(message.contains("os error"), "{}", message);
}

#[tokio::test]
async fn missing_program_keeps_the_os_error() {
    let op = CommandOperation::new("nope", "/no/prog");
    let message = message_of(&op).await;
    assert!(message.starts_with("io error in spawning /no/prog: "), "{}", message);
    assert!(message.contains("os error"), "{}", message);
}

#[tokio::test]
async fn final_answer_repeats_the_cause() {
    let op = ReplayOperation::new("replay", "/no/such.jsonl");
    let mut runner = Runner::new(RetryPolicy::no_retry(), TimeoutPolicy::default());
    let value = runner
        .run(&op, Args::new(), &Context::new(), &NoopSink)
        .await
        .to_value();
    assert!(value["final_answer"].as_str().unwrap().contains("os error"));
    assert!(value["summary"].as_str().unwrap().contains("os error"));
}
