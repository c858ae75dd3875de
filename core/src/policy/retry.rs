use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;

use crate::error::ConfigError;

use super::FailureKind;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_MS: u64 = 500;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_JITTER_MS: u64 = 250;

/// How many attempts an operation gets and how long to wait between them.
///
/// Built once through [`RetryPolicy::new`] (or `Default`) and never mutated;
/// per-run backoff state lives in [`Backoff`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_ms: u64,
    backoff_multiplier: f64,
    jitter_ms: u64,
    retry_on: HashSet<FailureKind>,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        backoff_ms: u64,
        backoff_multiplier: f64,
        jitter_ms: u64,
        retry_on: impl IntoIterator<Item = FailureKind>,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::Validation(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if !backoff_multiplier.is_finite() || backoff_multiplier < 1.0 {
            return Err(ConfigError::Validation(format!(
                "retry.backoff_multiplier must be a finite number >= 1.0, got {}",
                backoff_multiplier
            )));
        }
        Ok(Self {
            max_attempts,
            backoff_ms,
            backoff_multiplier,
            jitter_ms,
            retry_on: retry_on.into_iter().collect(),
        })
    }

    /// A policy that runs exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
            backoff_multiplier: 1.0,
            jitter_ms: 0,
            retry_on: HashSet::new(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff_ms(&self) -> u64 {
        self.backoff_ms
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    pub fn jitter_ms(&self) -> u64 {
        self.jitter_ms
    }

    pub fn retry_on(&self) -> &HashSet<FailureKind> {
        &self.retry_on
    }

    /// Whether a failure of `kind` on attempt number `attempt` (1-based)
    /// earns another attempt.
    pub fn should_retry(&self, attempt: u32, kind: FailureKind) -> bool {
        attempt < self.max_attempts && self.retry_on.contains(&kind)
    }

    /// Fresh backoff schedule for one `run`.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            current_ms: self.backoff_ms as f64,
            multiplier: self.backoff_multiplier,
            jitter_ms: self.jitter_ms,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter_ms: DEFAULT_JITTER_MS,
            retry_on: [FailureKind::TimeoutError, FailureKind::RuntimeError]
                .into_iter()
                .collect(),
        }
    }
}

/// Exponential backoff state for a single run.
///
/// The n-th call to [`Backoff::next_delay`] returns a delay in
/// `[base * multiplier^(n-1), base * multiplier^(n-1) + jitter]`.
#[derive(Debug, Clone)]
pub struct Backoff {
    current_ms: f64,
    multiplier: f64,
    jitter_ms: u64,
}

impl Backoff {
    pub fn next_delay(&mut self) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.jitter_ms)
        };
        self.next_delay_with_jitter(jitter)
    }

    /// Same as [`Backoff::next_delay`] with the random component supplied
    /// by the caller. `jitter` is clamped to the configured bound.
    pub fn next_delay_with_jitter(&mut self, jitter: u64) -> Duration {
        let base = self.current_ms.round() as u64;
        self.current_ms *= self.multiplier;
        Duration::from_millis(base.saturating_add(jitter.min(self.jitter_ms)))
    }
}
