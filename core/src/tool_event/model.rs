use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One item of an operation's live progress stream.
///
/// Serializes to the wire shape `{"type": "tool.<kind>", "payload": ...}`
/// that sinks receive verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    #[serde(rename = "tool.start")]
    Start { attempt: u32 },

    #[serde(rename = "tool.progress")]
    Progress {
        #[serde(default)]
        stage: String,
        #[serde(flatten)]
        detail: Map<String, Value>,
    },

    #[serde(rename = "tool.partial")]
    Partial(Map<String, Value>),

    /// Raw output; payload is either a string or a map.
    #[serde(rename = "tool.stdout")]
    Stdout(Value),

    #[serde(rename = "tool.error")]
    Error { message: String },

    #[serde(rename = "tool.end")]
    End {
        #[serde(default)]
        output: Option<Map<String, Value>>,
        #[serde(default)]
        observation: Map<String, Value>,
    },
}

pub const EVENT_TYPES: [&str; 6] = [
    "tool.start",
    "tool.progress",
    "tool.partial",
    "tool.stdout",
    "tool.error",
    "tool.end",
];

impl Event {
    pub fn progress(stage: impl Into<String>) -> Self {
        Event::Progress {
            stage: stage.into(),
            detail: Map::new(),
        }
    }

    pub fn stdout(text: impl Into<String>) -> Self {
        Event::Stdout(Value::String(text.into()))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Event::Error {
            message: message.into(),
        }
    }

    pub fn end(output: Option<Map<String, Value>>, observation: Map<String, Value>) -> Self {
        Event::End {
            output,
            observation,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Start { .. } => "tool.start",
            Event::Progress { .. } => "tool.progress",
            Event::Partial(_) => "tool.partial",
            Event::Stdout(_) => "tool.stdout",
            Event::Error { .. } => "tool.error",
            Event::End { .. } => "tool.end",
        }
    }

    /// `Error` and `End` close an attempt's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Error { .. } | Event::End { .. })
    }

    pub fn to_wire(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
