use crate::operation::{Args, Context, Operation};
use crate::policy::{RetryPolicy, TimeoutPolicy};

use super::attempt::{run_attempt, AttemptError, AttemptOutcome};
use super::result::{empty_result_observation, RunResult};
use super::sink::EventSink;
use super::validate::InputCheck;

pub const DEFAULT_MAX_VALIDATION_FAILURES: u32 = 2;

/// Supervises operations: validation, attempts, timeouts and retries.
///
/// The consecutive input-validation failure count lives on the runner and
/// carries over between `run` calls. `run` takes `&mut self`, so one runner
/// serves one logical request at a time; give unrelated requests their own
/// runner.
#[derive(Debug, Clone)]
pub struct Runner {
    retry: RetryPolicy,
    timeouts: TimeoutPolicy,
    pub(super) max_validation_failures: u32,
    pub(super) validation_failures: u32,
}

impl Runner {
    pub fn new(retry: RetryPolicy, timeouts: TimeoutPolicy) -> Self {
        for warning in timeouts.warnings() {
            tracing::warn!(target: "toolrun.config", "{}", warning);
        }
        Self {
            retry,
            timeouts,
            max_validation_failures: DEFAULT_MAX_VALIDATION_FAILURES,
            validation_failures: 0,
        }
    }

    /// Values below 1 are treated as 1.
    pub fn with_max_validation_failures(mut self, max: u32) -> Self {
        self.max_validation_failures = max.max(1);
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout_policy(&self) -> &TimeoutPolicy {
        &self.timeouts
    }

    pub fn max_validation_failures(&self) -> u32 {
        self.max_validation_failures
    }

    pub fn validation_failures(&self) -> u32 {
        self.validation_failures
    }

    pub fn reset_validation_failures(&mut self) {
        self.validation_failures = 0;
    }

    /// Runs `op` to a single [`RunResult`], forwarding every event to `sink`.
    pub async fn run(
        &mut self,
        op: &dyn Operation,
        args: Args,
        ctx: &Context,
        sink: &dyn EventSink,
    ) -> RunResult {
        let name = op.name().to_string();
        let args = match self.validate_input(op, args) {
            InputCheck::Accepted(args) => args,
            InputCheck::Rejected(result) => return result,
        };

        let max_attempts = self.retry.max_attempts();
        let mut backoff = self.retry.backoff();
        let mut attempt: u32 = 1;

        loop {
            tracing::debug!(
                target: "toolrun.runner",
                operation = %name,
                attempt,
                max_attempts,
                "attempt started"
            );

            let failure = match run_attempt(op, args.clone(), ctx, sink, &self.timeouts, attempt)
                .await
            {
                Ok(outcome) => {
                    // The stream completed, so the input was usable.
                    self.validation_failures = 0;
                    match outcome {
                        AttemptOutcome::Ended {
                            output,
                            observation,
                        } => {
                            if let Some(rejected) =
                                self.validate_output(op, output.as_ref(), attempt)
                            {
                                return rejected;
                            }
                            tracing::info!(
                                target: "toolrun.runner",
                                operation = %name,
                                attempt,
                                "operation completed"
                            );
                            return RunResult::success(observation, output);
                        }
                        AttemptOutcome::Empty => {
                            tracing::info!(
                                target: "toolrun.runner",
                                operation = %name,
                                attempt,
                                "operation produced no result"
                            );
                            return RunResult::success(empty_result_observation(&name), None);
                        }
                        AttemptOutcome::Errored { message } => AttemptError::Reported(message),
                    }
                }
                Err(e) => e,
            };

            let kind = failure.kind();
            let message = failure.to_string();
            if !self.retry.should_retry(attempt, kind) {
                tracing::warn!(
                    target: "toolrun.runner",
                    operation = %name,
                    attempt,
                    max_attempts,
                    kind = %kind,
                    error = %message,
                    "operation failed, giving up"
                );
                return RunResult::exhausted(&name, kind, &message, attempt, max_attempts);
            }

            let delay = backoff.next_delay();
            tracing::warn!(
                target: "toolrun.runner",
                operation = %name,
                attempt,
                max_attempts,
                kind = %kind,
                error = %message,
                delay_ms = delay.as_millis() as u64,
                "attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), TimeoutPolicy::default())
    }
}
