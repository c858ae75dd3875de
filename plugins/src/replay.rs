use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use toolrun_core::api::{Args, Context, Event, EventStream, OperationError, ParseError};
use toolrun_core::Operation;

/// Plays back a JSONL file of events, one event per line.
///
/// Each line may carry a `delay_ms` field; the event is yielded that long
/// after the previous one. `tool.start` lines are skipped since the runner
/// emits its own, which lets an events-out log be replayed as-is.
pub struct ReplayOperation {
    name: String,
    events_file: PathBuf,
}

impl ReplayOperation {
    pub fn new(name: impl Into<String>, events_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            events_file: events_file.into(),
        }
    }

    pub fn events_file(&self) -> &Path {
        &self.events_file
    }
}

/// Splits one replay line into its delay and event. Blank lines yield `None`.
pub fn parse_replay_line(line: &str) -> Result<Option<(Duration, Event)>, ParseError> {
    let s = line.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let mut value: Value = serde_json::from_str(s).map_err(ParseError::InvalidJson)?;
    let delay_ms = value
        .as_object_mut()
        .and_then(|obj| obj.remove("delay_ms"))
        .and_then(|d| d.as_u64())
        .unwrap_or(0);
    let event = Event::from_value(value)?;
    Ok(Some((Duration::from_millis(delay_ms), event)))
}

impl Operation for ReplayOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_stream<'a>(&'a self, _args: Args, _ctx: &'a Context) -> EventStream<'a> {
        Box::pin(async_stream::stream! {
            let content = match tokio::fs::read_to_string(&self.events_file).await {
                Ok(c) => c,
                Err(e) => {
                    let context = format!("reading {}", self.events_file.display());
                    yield Err(OperationError::io(context, e));
                    return;
                }
            };

            for (idx, line) in content.lines().enumerate() {
                match parse_replay_line(line) {
                    Ok(None) => {}
                    Ok(Some((_, Event::Start { .. }))) => {
                        tracing::debug!(target: "toolrun.plugins", line = idx + 1, "replay: skipping recorded start event");
                    }
                    Ok(Some((delay, event))) => {
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        yield Ok(event);
                    }
                    Err(e) => {
                        tracing::warn!(target: "toolrun.plugins", line = idx + 1, error = %e, "replay: invalid event line");
                        yield Err(OperationError::from(e));
                        return;
                    }
                }
            }
        })
    }
}
