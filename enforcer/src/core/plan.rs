//! Ordered step plans with per-step failure policy.
//!
//! Each enforcement action is expressed as a list of [`Step`]s. A blocking
//! step that fails ends the plan and marks it failed; a non-blocking step that
//! fails is recorded and the plan moves on.

use anyhow::Result;
use tracing::{debug, warn};

use crate::core::types::ExecutionResult;

type StepFn<'a> = Box<dyn FnOnce() -> Result<()> + 'a>;

/// A single side effect in an action plan.
pub struct Step<'a> {
    /// Audit tag recorded in `executed_actions` when the step completes.
    pub tag: &'static str,
    pub blocking: bool,
    run: StepFn<'a>,
}

impl<'a> Step<'a> {
    pub fn blocking(tag: &'static str, run: impl FnOnce() -> Result<()> + 'a) -> Self {
        Self {
            tag,
            blocking: true,
            run: Box::new(run),
        }
    }

    pub fn non_blocking(tag: &'static str, run: impl FnOnce() -> Result<()> + 'a) -> Self {
        Self {
            tag,
            blocking: false,
            run: Box::new(run),
        }
    }
}

/// Run steps strictly in order.
pub fn run_plan(steps: Vec<Step<'_>>) -> ExecutionResult {
    let mut result = ExecutionResult {
        success: true,
        ..ExecutionResult::default()
    };

    for step in steps {
        let Step { tag, blocking, run } = step;
        match run() {
            Ok(()) => {
                debug!(step = tag, "step completed");
                result.executed_actions.push(tag.to_string());
            }
            Err(err) => {
                let message = format!("{tag}: {err:#}");
                result.errors.push(message);
                if blocking {
                    warn!(
                        step = tag,
                        error = %format!("{err:#}"),
                        "blocking step failed; aborting action"
                    );
                    result.success = false;
                    break;
                }
                warn!(
                    step = tag,
                    error = %format!("{err:#}"),
                    "non-blocking step failed; continuing"
                );
            }
        }
    }

    result
}
