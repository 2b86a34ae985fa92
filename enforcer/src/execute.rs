//! Execution of a single enforcement decision.
//!
//! Each action becomes an ordered [`Step`] plan. Ledger writes and the
//! deactivation call are blocking; every message is non-blocking. See
//! [`run_plan`] for the failure policy.

use anyhow::{Result, anyhow};
use tracing::{info, instrument};

use crate::core::plan::{Step, run_plan};
use crate::core::types::{Action, Decision, ExecutionResult, Member, WarningRecord, WarningStatus};
use crate::io::ledger::WarningLedger;
use crate::io::messages::{AdminAlert, MessageRenderer};
use crate::io::messenger::{Deactivator, Messenger};

pub const CREATE_RECORD: &str = "create_record";
pub const INCREMENT_COUNT: &str = "increment_count";
pub const SEND_WARNING_DM: &str = "send_warning_dm";
pub const SEND_DEACTIVATION_NOTICE: &str = "send_deactivation_notice";
pub const DEACTIVATE_MEMBER: &str = "deactivate_member";
pub const MARK_DEACTIVATED: &str = "mark_deactivated";
pub const SEND_THANK_YOU_DM: &str = "send_thank_you_dm";
pub const DELETE_RECORD: &str = "delete_record";
pub const NOTIFY_ADMIN: &str = "notify_admin";

/// Carries out decisions against the ledger, messenger and deactivator.
pub struct Enforcer<'a, L, M, D> {
    ledger: &'a L,
    messenger: &'a M,
    deactivator: &'a D,
    renderer: MessageRenderer,
    admin_member_id: String,
}

impl<'a, L: WarningLedger, M: Messenger, D: Deactivator> Enforcer<'a, L, M, D> {
    pub fn new(
        ledger: &'a L,
        messenger: &'a M,
        deactivator: &'a D,
        admin_member_id: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            messenger,
            deactivator,
            renderer: MessageRenderer::new(),
            admin_member_id: admin_member_id.into(),
        }
    }

    pub fn ledger(&self) -> &L {
        self.ledger
    }

    /// Perform the side effects of `decision`.
    ///
    /// With `dry_run` nothing is touched and a single `DRY_RUN:<ACTION>` tag is
    /// recorded.
    #[instrument(
        skip_all,
        fields(email = %member.email, action = %decision.action, dry_run = dry_run)
    )]
    pub fn execute(
        &self,
        member: &Member,
        record: Option<&WarningRecord>,
        decision: &Decision,
        dry_run: bool,
    ) -> ExecutionResult {
        if dry_run {
            info!(
                level = decision.warning_level,
                reason = %decision.reason,
                "dry run: decision not executed"
            );
            return ExecutionResult::dry_run(decision.action);
        }

        let result = run_plan(self.plan(member, record, decision));
        info!(
            success = result.success,
            steps = ?result.executed_actions,
            errors = result.errors.len(),
            "decision executed"
        );
        result
    }

    fn plan<'s>(
        &'s self,
        member: &'s Member,
        record: Option<&'s WarningRecord>,
        decision: &'s Decision,
    ) -> Vec<Step<'s>> {
        let record_id = move || {
            record
                .map(|record| record.id.as_str())
                .ok_or_else(|| anyhow!("missing warning record for {}", member.email))
        };
        let level = decision.warning_level;

        match decision.action {
            Action::CreateWarning => vec![
                Step::blocking(CREATE_RECORD, move || {
                    self.ledger.create(&member.name, &member.email)?;
                    Ok(())
                }),
                Step::non_blocking(SEND_WARNING_DM, move || {
                    self.send_dm(member, self.renderer.warning(member, level))
                }),
            ],
            Action::IncrementWarning => {
                let mut steps = vec![
                    Step::blocking(INCREMENT_COUNT, move || {
                        self.ledger.increment_count(record_id()?)?;
                        Ok(())
                    }),
                    Step::non_blocking(SEND_WARNING_DM, move || {
                        self.send_dm(member, self.renderer.warning(member, level))
                    }),
                ];
                if decision.should_notify_admin {
                    steps.push(Step::non_blocking(NOTIFY_ADMIN, move || {
                        self.alert_admin(AdminAlert::FinalWarning, member, decision)
                    }));
                }
                steps
            }
            Action::Deactivate => vec![
                Step::non_blocking(SEND_DEACTIVATION_NOTICE, move || {
                    self.send_dm(member, self.renderer.deactivation(member))
                }),
                Step::blocking(DEACTIVATE_MEMBER, move || {
                    self.deactivator.deactivate(&member.id)
                }),
                Step::blocking(MARK_DEACTIVATED, move || {
                    self.ledger
                        .set_status(record_id()?, WarningStatus::Deactivated)?;
                    Ok(())
                }),
                Step::non_blocking(NOTIFY_ADMIN, move || {
                    self.alert_admin(AdminAlert::Deactivation, member, decision)
                }),
            ],
            Action::PhotoAdded => vec![
                Step::non_blocking(SEND_THANK_YOU_DM, move || {
                    self.send_dm(member, self.renderer.thank_you(member))
                }),
                Step::blocking(DELETE_RECORD, move || self.ledger.delete(record_id()?)),
            ],
            Action::Skip => {
                if decision.should_notify_admin {
                    vec![Step::non_blocking(NOTIFY_ADMIN, move || {
                        self.alert_admin(AdminAlert::Anomaly, member, decision)
                    })]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn send_dm(&self, member: &Member, body: Result<String>) -> Result<()> {
        self.deliver(&member.id, &body?)
    }

    fn alert_admin(&self, alert: AdminAlert, member: &Member, decision: &Decision) -> Result<()> {
        let body = self.renderer.admin_alert(alert, member, decision)?;
        self.deliver(&self.admin_member_id, &body)
    }

    fn deliver(&self, recipient_id: &str, body: &str) -> Result<()> {
        let outcome = self.messenger.send_direct_message(recipient_id, body);
        if outcome.success {
            return Ok(());
        }
        Err(anyhow!(
            "message to {recipient_id} not delivered: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        ))
    }
}
