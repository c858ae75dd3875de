use serde_json::{Map, Value};

use crate::operation::{Args, Operation};

use super::result::RunResult;
use super::Runner;

pub(crate) enum InputCheck {
    Accepted(Args),
    Rejected(RunResult),
}

impl Runner {
    /// Checks arguments against the operation's input schema.
    ///
    /// Rejections never consume an attempt. The `max_validation_failures`-th
    /// consecutive rejection on this runner is terminal.
    pub(crate) fn validate_input(&mut self, op: &dyn Operation, args: Args) -> InputCheck {
        let Some(schema) = op.input_schema() else {
            return InputCheck::Accepted(args);
        };
        match schema.validate(&args) {
            Ok(valid) => InputCheck::Accepted(valid),
            Err(err) => {
                self.validation_failures = self.validation_failures.saturating_add(1);
                let failures = self.validation_failures;
                if failures >= self.max_validation_failures {
                    tracing::warn!(
                        target: "toolrun.runner",
                        operation = op.name(),
                        failures,
                        "input rejected repeatedly, abandoning execution"
                    );
                    InputCheck::Rejected(RunResult::repeated_validation_error(
                        op.name(),
                        &err,
                        failures,
                    ))
                } else {
                    tracing::info!(
                        target: "toolrun.runner",
                        operation = op.name(),
                        failures,
                        error = %err,
                        "input rejected"
                    );
                    InputCheck::Rejected(RunResult::validation_error(op.name(), &err))
                }
            }
        }
    }

    /// Checks an `End` event's output; `Some` carries the terminal failure.
    pub(crate) fn validate_output(
        &self,
        op: &dyn Operation,
        output: Option<&Map<String, Value>>,
        attempt: u32,
    ) -> Option<RunResult> {
        let (Some(schema), Some(output)) = (op.output_schema(), output) else {
            return None;
        };
        let err = schema.validate(output).err()?;
        tracing::warn!(
            target: "toolrun.runner",
            operation = op.name(),
            attempt,
            error = %err,
            "output rejected"
        );
        Some(RunResult::output_validation_error(
            op.name(),
            &err,
            attempt,
            self.retry_policy().max_attempts(),
        ))
    }
}
