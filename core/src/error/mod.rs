mod config_error;
mod operation_error;
mod parse_error;
mod sink_error;

pub use config_error::ConfigError;
pub use operation_error::OperationError;
pub use parse_error::ParseError;
pub use sink_error::SinkError;
