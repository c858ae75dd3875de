pub mod sink;
pub mod writer;

pub use crate::config::EventsOutConfig;
pub use sink::EventsOutSink;
pub use writer::{start_events_out, EventsOutTx, EventsOutWriter, STDOUT_PATH};
