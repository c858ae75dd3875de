use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_START_TIMEOUT_S: u64 = 30;
pub const DEFAULT_IDLE_TIMEOUT_S: u64 = 60;
pub const DEFAULT_HARD_TIMEOUT_S: u64 = 300;

/// Three-tier timeout configuration for one attempt.
///
/// - `start`: maximum wait for the first event of an attempt.
/// - `idle`: maximum gap between consecutive events once streaming began.
/// - `hard`: ceiling on the whole attempt, never below `start + idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    start: Duration,
    idle: Duration,
    hard: Duration,
}

impl TimeoutPolicy {
    pub fn new(
        start_timeout_s: u64,
        idle_timeout_s: u64,
        hard_timeout_s: u64,
    ) -> Result<Self, ConfigError> {
        Self::from_durations(
            Duration::from_secs(start_timeout_s),
            Duration::from_secs(idle_timeout_s),
            Duration::from_secs(hard_timeout_s),
        )
    }

    pub fn from_durations(
        start: Duration,
        idle: Duration,
        hard: Duration,
    ) -> Result<Self, ConfigError> {
        for (name, value) in [("start", start), ("idle", idle), ("hard", hard)] {
            if value.is_zero() {
                return Err(ConfigError::Validation(format!(
                    "timeout.{}_timeout_s must be greater than zero",
                    name
                )));
            }
        }
        Ok(Self { start, idle, hard })
    }

    pub fn start_timeout(&self) -> Duration {
        self.start
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle
    }

    /// The hard timeout as configured, before clamping.
    pub fn configured_hard_timeout(&self) -> Duration {
        self.hard
    }

    /// Ceiling actually enforced on an attempt: `max(hard, start + idle)`.
    pub fn effective_hard_timeout(&self) -> Duration {
        self.hard.max(self.start.saturating_add(self.idle))
    }

    /// Configuration warnings worth surfacing to an operator.
    pub fn warnings(&self) -> Vec<String> {
        let floor = self.start.saturating_add(self.idle);
        if self.hard < floor {
            vec![format!(
                "hard timeout {}s is below start+idle ({}s); {}s will be enforced instead",
                self.hard.as_secs_f64(),
                floor.as_secs_f64(),
                floor.as_secs_f64()
            )]
        } else {
            Vec::new()
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            start: Duration::from_secs(DEFAULT_START_TIMEOUT_S),
            idle: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_S),
            hard: Duration::from_secs(DEFAULT_HARD_TIMEOUT_S),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_hard_timeout_keeps_larger_hard() {
        let p = TimeoutPolicy::new(5, 10, 30).unwrap();
        assert_eq!(p.effective_hard_timeout(), Duration::from_secs(30));
        assert!(p.warnings().is_empty());
    }

    #[test]
    fn effective_hard_timeout_is_clamped_to_start_plus_idle() {
        let p = TimeoutPolicy::new(5, 10, 3).unwrap();
        assert_eq!(p.configured_hard_timeout(), Duration::from_secs(3));
        assert_eq!(p.effective_hard_timeout(), Duration::from_secs(15));
        let warnings = p.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("below start+idle"));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        assert!(TimeoutPolicy::new(0, 10, 30).is_err());
        assert!(TimeoutPolicy::new(5, 0, 30).is_err());
        assert!(TimeoutPolicy::new(5, 10, 0).is_err());
    }

    #[test]
    fn defaults_are_consistent() {
        let p = TimeoutPolicy::default();
        assert!(p.effective_hard_timeout() >= p.start_timeout() + p.idle_timeout());
    }
}
