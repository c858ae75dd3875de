use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policy::{
    FailureKind, RetryPolicy, TimeoutPolicy, DEFAULT_BACKOFF_MS, DEFAULT_BACKOFF_MULTIPLIER,
    DEFAULT_HARD_TIMEOUT_S, DEFAULT_IDLE_TIMEOUT_S, DEFAULT_JITTER_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_START_TIMEOUT_S,
};
use crate::runner::{Runner, DEFAULT_MAX_VALIDATION_FAILURES};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub timeout: TimeoutConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub events_out: EventsOutConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationConfig>,
}

impl AppConfig {
    pub fn build_runner(&self) -> Result<Runner, ConfigError> {
        Ok(Runner::new(self.retry.to_policy()?, self.timeout.to_policy()?)
            .with_max_validation_failures(self.validation.max_validation_failures))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    #[serde(default = "default_retry_on")]
    pub retry_on: Vec<FailureKind>,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_ms() -> u64 {
    DEFAULT_BACKOFF_MS
}

fn default_backoff_multiplier() -> f64 {
    DEFAULT_BACKOFF_MULTIPLIER
}

fn default_jitter_ms() -> u64 {
    DEFAULT_JITTER_MS
}

fn default_retry_on() -> Vec<FailureKind> {
    vec![FailureKind::TimeoutError, FailureKind::RuntimeError]
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_ms: default_jitter_ms(),
            retry_on: default_retry_on(),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> Result<RetryPolicy, ConfigError> {
        RetryPolicy::new(
            self.max_attempts,
            self.backoff_ms,
            self.backoff_multiplier,
            self.jitter_ms,
            self.retry_on.iter().copied(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_start_timeout_s")]
    pub start_timeout_s: u64,

    #[serde(default = "default_idle_timeout_s")]
    pub idle_timeout_s: u64,

    #[serde(default = "default_hard_timeout_s")]
    pub hard_timeout_s: u64,
}

fn default_start_timeout_s() -> u64 {
    DEFAULT_START_TIMEOUT_S
}

fn default_idle_timeout_s() -> u64 {
    DEFAULT_IDLE_TIMEOUT_S
}

fn default_hard_timeout_s() -> u64 {
    DEFAULT_HARD_TIMEOUT_S
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            start_timeout_s: default_start_timeout_s(),
            idle_timeout_s: default_idle_timeout_s(),
            hard_timeout_s: default_hard_timeout_s(),
        }
    }
}

impl TimeoutConfig {
    pub fn to_policy(&self) -> Result<TimeoutPolicy, ConfigError> {
        TimeoutPolicy::new(self.start_timeout_s, self.idle_timeout_s, self.hard_timeout_s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_max_validation_failures")]
    pub max_validation_failures: u32,
}

fn default_max_validation_failures() -> u32 {
    DEFAULT_MAX_VALIDATION_FAILURES
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_validation_failures: default_max_validation_failures(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsOutConfig {
    #[serde(default)]
    pub enabled: bool,

    /// File path, or `stdout:` to write to standard output.
    #[serde(default = "default_events_out_path")]
    pub path: String,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default)]
    pub drop_when_full: bool,
}

fn default_events_out_path() -> String {
    "toolrun.events.jsonl".to_string()
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for EventsOutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_events_out_path(),
            channel_capacity: default_channel_capacity(),
            drop_when_full: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// When set, logs also go to a daily-rolling file in this directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file_prefix() -> String {
    "toolrun.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_log_file_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum OperationConfig {
    #[serde(rename = "replay")]
    Replay(ReplayOperationConfig),
    #[serde(rename = "command")]
    Command(CommandOperationConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReplayOperationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub events_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommandOperationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}
