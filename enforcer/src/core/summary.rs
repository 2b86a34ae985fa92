//! Run-level report folding.

use serde::Serialize;

use crate::core::types::{Action, Decision, ExecutionResult};

/// Tally of decisions by action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub create_warning: usize,
    pub increment_warning: usize,
    pub deactivate: usize,
    pub photo_added: usize,
    pub skip: usize,
}

impl ActionCounts {
    fn bump(&mut self, action: Action) {
        let slot = match action {
            Action::CreateWarning => &mut self.create_warning,
            Action::IncrementWarning => &mut self.increment_warning,
            Action::Deactivate => &mut self.deactivate,
            Action::PhotoAdded => &mut self.photo_added,
            Action::Skip => &mut self.skip,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub email: Option<String>,
    pub message: String,
    /// Set when the failure aborted the whole run.
    pub fatal: bool,
}

/// What happened to one member during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberOutcome {
    pub email: String,
    pub decision: Decision,
    pub result: ExecutionResult,
}

/// Aggregate report for a single enforcement run. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub filter_email: Option<String>,
    pub total_members: usize,
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub actions: ActionCounts,
    pub final_warnings: usize,
    pub deactivations: usize,
    pub duration_ms: u64,
    pub error_details: Vec<ErrorDetail>,
    pub outcomes: Vec<MemberOutcome>,
}

impl RunSummary {
    pub fn new(dry_run: bool, filter_email: Option<String>) -> Self {
        Self {
            dry_run,
            filter_email,
            ..Self::default()
        }
    }

    /// Fold one member's decision and execution result into the counters.
    pub fn record(&mut self, email: &str, decision: Decision, result: ExecutionResult) {
        self.total_members += 1;
        self.actions.bump(decision.action);

        if result.success {
            if decision.action != Action::Skip {
                self.processed += 1;
            }
        } else {
            self.errors += 1;
            for message in &result.errors {
                self.error_details.push(ErrorDetail {
                    email: Some(email.to_string()),
                    message: message.clone(),
                    fatal: false,
                });
            }
        }

        if decision.warning_level == 4 && decision.should_notify_admin {
            self.final_warnings += 1;
        }
        if decision.action == Action::Deactivate && result.success {
            self.deactivations += 1;
        }

        self.outcomes.push(MemberOutcome {
            email: email.to_string(),
            decision,
            result,
        });
    }

    /// Record a member whose cycle failed before execution.
    pub fn record_failure(&mut self, email: &str, message: String) {
        self.total_members += 1;
        self.errors += 1;
        self.error_details.push(ErrorDetail {
            email: Some(email.to_string()),
            message,
            fatal: false,
        });
    }

    /// Record a failure that aborted the run.
    pub fn record_fatal(&mut self, message: String) {
        self.error_details.push(ErrorDetail {
            email: None,
            message,
            fatal: true,
        });
    }

    pub fn is_aborted(&self) -> bool {
        self.error_details.iter().any(|detail| detail.fatal)
    }

    pub fn finish(&mut self, duration_ms: u64) {
        self.skipped = self
            .total_members
            .saturating_sub(self.processed)
            .saturating_sub(self.errors);
        self.duration_ms = duration_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(action: Action, level: u32, notify: bool) -> Decision {
        Decision {
            action,
            warning_level: level,
            should_notify_admin: notify,
            reason: "r".to_string(),
        }
    }

    fn ok() -> ExecutionResult {
        ExecutionResult {
            success: true,
            executed_actions: vec!["step".to_string()],
            errors: Vec::new(),
        }
    }

    #[test]
    fn skip_counts_toward_skipped_not_processed() {
        let mut summary = RunSummary::new(false, None);
        summary.record("a@example.com", decision(Action::Skip, 0, false), ok());
        summary.record("b@example.com", decision(Action::CreateWarning, 1, false), ok());
        summary.finish(12);

        assert_eq!(summary.total_members, 2);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.actions.skip, 1);
        assert_eq!(summary.actions.create_warning, 1);
        assert_eq!(summary.duration_ms, 12);
    }

    #[test]
    fn failed_execution_counts_as_error_with_details() {
        let mut summary = RunSummary::new(false, None);
        let failed = ExecutionResult {
            success: false,
            executed_actions: Vec::new(),
            errors: vec!["deactivate_member: 500".to_string()],
        };
        summary.record("a@example.com", decision(Action::Deactivate, 5, true), failed);
        summary.finish(0);

        assert_eq!(summary.errors, 1);
        assert_eq!(summary.deactivations, 0);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.error_details.len(), 1);
        assert_eq!(summary.error_details[0].email.as_deref(), Some("a@example.com"));
        assert!(!summary.is_aborted());
    }

    #[test]
    fn non_blocking_errors_are_not_counted_as_member_errors() {
        let mut summary = RunSummary::new(false, None);
        let partial = ExecutionResult {
            success: true,
            executed_actions: vec!["create_record".to_string()],
            errors: vec!["send_warning_dm: timeout".to_string()],
        };
        summary.record("a@example.com", decision(Action::CreateWarning, 1, false), partial);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.processed, 1);
        assert!(summary.error_details.is_empty());
    }

    #[test]
    fn final_warnings_and_deactivations_are_tracked() {
        let mut summary = RunSummary::new(false, None);
        summary.record("a@example.com", decision(Action::IncrementWarning, 4, true), ok());
        summary.record("b@example.com", decision(Action::Deactivate, 5, true), ok());
        assert_eq!(summary.final_warnings, 1);
        assert_eq!(summary.deactivations, 1);
    }

    #[test]
    fn fatal_entry_marks_run_aborted() {
        let mut summary = RunSummary::new(true, None);
        summary.record_fatal("safety limit".to_string());
        summary.finish(1);
        assert!(summary.is_aborted());
        assert_eq!(summary.total_members, 0);
        assert_eq!(summary.skipped, 0);
    }
}
