use serde_json::{Map, Value};

use crate::error::ParseError;

use super::model::{Event, EVENT_TYPES};

const TYPE_PREFIX: &str = "tool.";

impl Event {
    /// Normalizes a loosely-shaped event map into an [`Event`].
    ///
    /// Accepted shapes:
    /// - wire shape: `{"type": "tool.end", "payload": {...}}`
    /// - short type names: `{"type": "end", "payload": {...}}`
    /// - flat maps, payload fields next to `type`: `{"type": "progress", "stage": "x"}`
    pub fn from_value(value: Value) -> Result<Event, ParseError> {
        let Value::Object(mut obj) = value else {
            return Err(ParseError::SchemaMismatch(
                "event must be a JSON object".to_string(),
            ));
        };

        let raw_type = match obj.remove("type") {
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(ParseError::SchemaMismatch(
                    "event type must be a string".to_string(),
                ))
            }
            None => return Err(ParseError::MissingField("type")),
        };
        let event_type = normalize_type(&raw_type);
        if !EVENT_TYPES.contains(&event_type.as_str()) {
            return Err(ParseError::UnknownEventType(raw_type));
        }

        let payload = match obj.remove("payload") {
            Some(p) => p,
            None => flat_payload(&event_type, obj),
        };

        let mut wire = Map::new();
        wire.insert("type".to_string(), Value::String(event_type));
        wire.insert("payload".to_string(), payload);
        serde_json::from_value(Value::Object(wire))
            .map_err(|e| ParseError::SchemaMismatch(e.to_string()))
    }
}

/// Parses one JSONL line. Blank lines yield `Ok(None)`.
pub fn parse_event_line(line: &str) -> Result<Option<Event>, ParseError> {
    let s = line.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let v: Value = serde_json::from_str(s).map_err(ParseError::InvalidJson)?;
    Event::from_value(v).map(Some)
}

fn normalize_type(raw: &str) -> String {
    let t = raw.trim();
    if t.starts_with(TYPE_PREFIX) {
        t.to_string()
    } else {
        format!("{}{}", TYPE_PREFIX, t)
    }
}

fn flat_payload(event_type: &str, rest: Map<String, Value>) -> Value {
    // A flat stdout event usually carries its text under a single key.
    if event_type == "tool.stdout" && rest.len() == 1 {
        if let Some(text) = rest.get("text").or_else(|| rest.get("line")) {
            return text.clone();
        }
    }
    Value::Object(rest)
}
