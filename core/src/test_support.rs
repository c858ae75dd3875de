//! Scripted operations and streams for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::OperationError;
use crate::operation::{Args, Context, EventStream, ObjectSchema, Operation, Schema};
use crate::tool_event::Event;

/// `(delay_ms, item)` pairs; the stream ends after the last item.
pub(crate) fn scripted_stream(
    script: Vec<(u64, Result<Event, OperationError>)>,
) -> EventStream<'static> {
    Box::pin(async_stream::stream! {
        for (delay_ms, item) in script {
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            yield item;
        }
    })
}

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Emit(u64, Event),
    Fail(u64, String),
    Hang,
}

impl Step {
    pub(crate) fn now(event: Event) -> Self {
        Step::Emit(0, event)
    }
}

/// Operation that plays one script per attempt, repeating the last one.
pub(crate) struct ScriptedOperation {
    name: String,
    scripts: Mutex<VecDeque<Vec<Step>>>,
    last: Mutex<Vec<Step>>,
    calls: AtomicU32,
    input: Option<ObjectSchema>,
    output: Option<ObjectSchema>,
}

impl ScriptedOperation {
    pub(crate) fn new(name: &str, scripts: Vec<Vec<Step>>) -> Self {
        Self {
            name: name.to_string(),
            scripts: Mutex::new(scripts.into()),
            last: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
            input: None,
            output: None,
        }
    }

    pub(crate) fn repeating(name: &str, script: Vec<Step>) -> Self {
        Self::new(name, vec![script])
    }

    pub(crate) fn with_input(mut self, schema: ObjectSchema) -> Self {
        self.input = Some(schema);
        self
    }

    pub(crate) fn with_output(mut self, schema: ObjectSchema) -> Self {
        self.output = Some(schema);
        self
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_script(&self) -> Vec<Step> {
        let mut scripts = self.scripts.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(s) = scripts.pop_front() {
            *last = s;
        }
        last.clone()
    }
}

impl Operation for ScriptedOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_schema(&self) -> Option<&dyn Schema> {
        self.input.as_ref().map(|s| s as &dyn Schema)
    }

    fn output_schema(&self) -> Option<&dyn Schema> {
        self.output.as_ref().map(|s| s as &dyn Schema)
    }

    fn run_stream<'a>(&'a self, _args: Args, _ctx: &'a Context) -> EventStream<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.next_script();
        Box::pin(async_stream::stream! {
            for step in script {
                match step {
                    Step::Emit(delay_ms, event) => {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        yield Ok(event);
                    }
                    Step::Fail(delay_ms, message) => {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        yield Err(OperationError::failed(message));
                    }
                    Step::Hang => {
                        futures::future::pending::<()>().await;
                    }
                }
            }
        })
    }
}
