//! Supervised execution of streaming operations: event gating, schema checks,
//! bounded retry and a terminal result shaped for an agent loop.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod events_out;
pub mod operation;
pub mod policy;
pub mod runner;
pub mod tool_event;

#[cfg(test)]
mod test_support;

pub use context::AppContext;
pub use operation::{Args, Context, EventStream, Operation};
pub use runner::{RunResult, Runner};
pub use tool_event::Event;
