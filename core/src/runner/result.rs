use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::operation::{FieldError, SchemaError};
use crate::policy::{ErrorKind, FailureKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    pub suggestion: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

/// Outcome of one `Runner::run` call, returned to the caller directly
/// (distinct from the event stream the sink sees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunResult {
    Success {
        observation: Map<String, Value>,
        output: Option<Map<String, Value>>,
    },
    Failure {
        summary: String,
        error: ErrorDetail,
        /// Tells an outer orchestration loop to stop calling this operation.
        analysis_complete: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        final_answer: Option<String>,
    },
}

impl RunResult {
    pub fn success(observation: Map<String, Value>, output: Option<Map<String, Value>>) -> Self {
        RunResult::Success {
            observation,
            output,
        }
    }

    /// Bad input the caller can still correct; no attempt consumed.
    pub fn validation_error(operation: &str, err: &SchemaError) -> Self {
        RunResult::Failure {
            summary: format!("Invalid arguments for {}: {}", operation, err),
            error: ErrorDetail {
                kind: ErrorKind::ValidationError,
                message: err.to_string(),
                attempts: None,
                max_attempts: None,
                suggestion: format!(
                    "Fix the fields listed in error.details and call {} again.",
                    operation
                ),
                details: err.errors.clone(),
            },
            analysis_complete: false,
            final_answer: None,
        }
    }

    pub fn repeated_validation_error(operation: &str, err: &SchemaError, failures: u32) -> Self {
        RunResult::Failure {
            summary: format!(
                "{} rejected its arguments {} times in a row; execution abandoned",
                operation, failures
            ),
            error: ErrorDetail {
                kind: ErrorKind::RepeatedValidationError,
                message: err.to_string(),
                attempts: None,
                max_attempts: None,
                suggestion: format!(
                    "Stop calling {} with guessed arguments; review its input schema first.",
                    operation
                ),
                details: err.errors.clone(),
            },
            analysis_complete: true,
            final_answer: Some(format!(
                "Unable to run {}: its arguments failed validation {} consecutive times ({}).",
                operation, failures, err
            )),
        }
    }

    pub fn output_validation_error(
        operation: &str,
        err: &SchemaError,
        attempts: u32,
        max_attempts: u32,
    ) -> Self {
        RunResult::Failure {
            summary: format!("{} returned output that failed validation", operation),
            error: ErrorDetail {
                kind: ErrorKind::OutputValidationError,
                message: err.to_string(),
                attempts: Some(attempts),
                max_attempts: Some(max_attempts),
                suggestion: format!(
                    "{} produced malformed output; report the problem instead of retrying.",
                    operation
                ),
                details: err.errors.clone(),
            },
            analysis_complete: true,
            final_answer: Some(format!(
                "{} finished but its output did not match the declared shape: {}",
                operation, err
            )),
        }
    }

    /// Execution failure after the retry budget is spent or the failure
    /// kind is not retryable.
    pub fn exhausted(
        operation: &str,
        kind: FailureKind,
        message: &str,
        attempts: u32,
        max_attempts: u32,
    ) -> Self {
        let suggestion = match kind {
            FailureKind::TimeoutError => format!(
                "{} did not respond in time; narrow the request or raise the timeouts.",
                operation
            ),
            FailureKind::RuntimeError => format!(
                "{} failed while running; check its arguments and the availability of what it depends on.",
                operation
            ),
        };
        RunResult::Failure {
            summary: format!(
                "{} failed after {} attempt(s): {}",
                operation, attempts, message
            ),
            error: ErrorDetail {
                kind: kind.into(),
                message: message.to_string(),
                attempts: Some(attempts),
                max_attempts: Some(max_attempts),
                suggestion,
                details: Vec::new(),
            },
            analysis_complete: true,
            final_answer: Some(format!(
                "Execution of {} stopped after {} of {} attempt(s) with {}: {}",
                operation, attempts, max_attempts, kind, message
            )),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Success { .. })
    }

    pub fn analysis_complete(&self) -> bool {
        match self {
            RunResult::Success { .. } => false,
            RunResult::Failure {
                analysis_complete, ..
            } => *analysis_complete,
        }
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        match self {
            RunResult::Success { .. } => None,
            RunResult::Failure { error, .. } => Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|e| e.kind)
    }

    pub fn observation(&self) -> Option<&Map<String, Value>> {
        match self {
            RunResult::Success { observation, .. } => Some(observation),
            RunResult::Failure { .. } => None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Observation reported when a stream closes without `Error` or `End`.
pub fn empty_result_observation(operation: &str) -> Map<String, Value> {
    let mut error = Map::new();
    error.insert(
        "type".to_string(),
        Value::String(ErrorKind::EmptyResult.as_str().to_string()),
    );
    let mut obs = Map::new();
    obs.insert(
        "summary".to_string(),
        Value::String(format!("{} produced no result", operation)),
    );
    obs.insert("error".to_string(), Value::Object(error));
    obs
}
