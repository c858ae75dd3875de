use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field.
    pub loc: String,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn missing(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            msg: "field required".to_string(),
            kind: "missing".to_string(),
        }
    }

    pub fn type_error(loc: impl Into<String>, expected: FieldType, got: &Value) -> Self {
        Self {
            loc: loc.into(),
            msg: format!("expected {}, got {}", expected, json_type_name(got)),
            kind: "type_error".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub errors: Vec<FieldError>,
}

impl SchemaError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())?;
        for e in &self.errors {
            write!(f, "; {}: {}", e.loc, e.msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Validating constructor for an operation's input or output shape.
pub trait Schema: Send + Sync {
    /// Checks `data` and returns the accepted map.
    fn validate(&self, data: &Map<String, Value>) -> Result<Map<String, Value>, SchemaError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Any,
}

impl FieldType {
    pub fn accepts(&self, v: &Value) -> bool {
        match self {
            FieldType::String => v.is_string(),
            FieldType::Integer => v.is_i64() || v.is_u64(),
            FieldType::Number => v.is_number(),
            FieldType::Boolean => v.is_boolean(),
            FieldType::Object => v.is_object(),
            FieldType::Array => v.is_array(),
            FieldType::Any => true,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Any => "any",
        };
        f.write_str(s)
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone)]
struct FieldSpec {
    name: String,
    ty: FieldType,
    required: bool,
}

/// Flat object schema: named fields with a type, required or optional.
/// Unknown fields pass through untouched.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<FieldSpec>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty,
            required: false,
        });
        self
    }
}

impl Schema for ObjectSchema {
    fn validate(&self, data: &Map<String, Value>) -> Result<Map<String, Value>, SchemaError> {
        let mut errors = Vec::new();
        for field in &self.fields {
            match data.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    errors.push(FieldError::missing(&field.name))
                }
                None | Some(Value::Null) => {}
                Some(v) if !field.ty.accepts(v) => {
                    errors.push(FieldError::type_error(&field.name, field.ty, v))
                }
                Some(_) => {}
            }
        }
        if errors.is_empty() {
            Ok(data.clone())
        } else {
            Err(SchemaError::new(errors))
        }
    }
}
