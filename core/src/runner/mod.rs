//! The supervision engine: gate, attempt loop, validation and retry.

mod attempt;
pub mod gate;
mod result;
mod run;
mod sink;
mod validate;

pub use gate::{GateError, GateState, StreamGate};
pub use result::{empty_result_observation, ErrorDetail, RunResult};
pub use run::{Runner, DEFAULT_MAX_VALIDATION_FAILURES};
pub use sink::{ChannelSink, EventSink, NoopSink};
