//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `toolrun_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from_path, AppConfig, CommandOperationConfig, EventsOutConfig,
    LoggingConfig, OperationConfig, ReplayOperationConfig,
};
pub use crate::context::AppContext;
pub use crate::error::{ConfigError, OperationError, ParseError, SinkError};
pub use crate::operation::{
    Args, Context, EventStream, FieldError, FieldType, ObjectSchema, Operation, Schema,
    SchemaError,
};
pub use crate::policy::{ErrorKind, FailureKind, RetryPolicy, TimeoutPolicy};
pub use crate::runner::{
    ChannelSink, ErrorDetail, EventSink, GateError, NoopSink, RunResult, Runner, StreamGate,
};
pub use crate::tool_event::{parse_event_line, Event};
