use futures::stream::BoxStream;
use serde_json::{Map, Value};

use crate::error::OperationError;
use crate::tool_event::Event;

use super::Schema;

/// Raw key/value arguments handed to an operation.
pub type Args = Map<String, Value>;

/// Caller-supplied execution context (request ids, user info, ...).
pub type Context = Map<String, Value>;

/// Live event stream of one attempt. Dropping it cancels the operation.
pub type EventStream<'a> = BoxStream<'a, Result<Event, OperationError>>;

/// A unit of work supervised by the runner.
///
/// Implementations only describe what they compute; timeouts, retries and
/// validation are applied from the outside. Streams are expected to yield
/// exactly one terminal event (`Error` or `End`) and to tolerate being
/// dropped at any await point.
pub trait Operation: Send + Sync {
    fn name(&self) -> &str;

    fn input_schema(&self) -> Option<&dyn Schema> {
        None
    }

    fn output_schema(&self) -> Option<&dyn Schema> {
        None
    }

    /// Starts one attempt. Called once per attempt with the validated arguments.
    fn run_stream<'a>(&'a self, args: Args, ctx: &'a Context) -> EventStream<'a>;
}
