use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Event;

/// One line of the events-out JSONL log: an event plus the run it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapperEvent {
    pub v: i32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub ts: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl WrapperEvent {
    pub fn new(event_type: &str, ts: String) -> Self {
        Self {
            v: 1,
            event_type: event_type.to_string(),
            ts,
            run_id: None,
            operation: None,
            payload: None,
        }
    }

    /// Wraps a wire-shaped event map. Maps without a string `type` are
    /// recorded as `tool.unknown` so nothing the sink receives is lost.
    pub fn from_wire(wire: &Value, ts: String) -> Self {
        let event_type = wire
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("tool.unknown");
        let mut ev = Self::new(event_type, ts);
        ev.payload = wire.get("payload").cloned();
        ev
    }

    pub fn from_event(event: &Event, ts: String) -> Self {
        Self::from_wire(&event.to_wire(), ts)
    }
}
