pub mod model;
pub mod parser;
pub mod wrapper_event;

pub use model::{Event, EVENT_TYPES};
pub use parser::parse_event_line;
pub use wrapper_event::WrapperEvent;
