use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a failed attempt, used for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TimeoutError,
    RuntimeError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::TimeoutError => "timeout_error",
            FailureKind::RuntimeError => "runtime_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every error type that can appear in a `RunResult` or an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    RepeatedValidationError,
    OutputValidationError,
    TimeoutError,
    RuntimeError,
    EmptyResult,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::RepeatedValidationError => "repeated_validation_error",
            ErrorKind::OutputValidationError => "output_validation_error",
            ErrorKind::TimeoutError => "timeout_error",
            ErrorKind::RuntimeError => "runtime_error",
            ErrorKind::EmptyResult => "empty_result",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FailureKind> for ErrorKind {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::TimeoutError => ErrorKind::TimeoutError,
            FailureKind::RuntimeError => ErrorKind::RuntimeError,
        }
    }
}
