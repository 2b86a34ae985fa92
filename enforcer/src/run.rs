//! Run aggregation: drives every candidate through decide and execute.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::core::decision::decide;
use crate::core::summary::RunSummary;
use crate::core::types::Member;
use crate::execute::Enforcer;
use crate::io::directory::{FetchLimits, MemberDirectory, fetch_directory};
use crate::io::ledger::WarningLedger;
use crate::io::messenger::{Deactivator, Messenger};

/// Caller-supplied switches for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Decide for every member but perform no mutation or message send.
    pub dry_run: bool,
    /// Restrict both passes to a single email (case-insensitive).
    pub filter_email: Option<String>,
}

impl RunOptions {
    fn admits(&self, email: &str) -> bool {
        match &self.filter_email {
            Some(filter) => email.trim().eq_ignore_ascii_case(filter.trim()),
            None => true,
        }
    }
}

/// Run one enforcement sweep.
///
/// 1. Fetch the directory and process every member without a photo.
/// 2. Sweep active ledger records whose member now has a photo.
///
/// Always returns a summary. A directory fetch failure (including the
/// population safety limit) is recorded as a fatal entry and ends the run
/// before anything is executed.
pub fn run_enforcement<Dir, L, M, D>(
    directory: &Dir,
    enforcer: &Enforcer<'_, L, M, D>,
    limits: &FetchLimits,
    options: &RunOptions,
) -> RunSummary
where
    Dir: MemberDirectory,
    L: WarningLedger,
    M: Messenger,
    D: Deactivator,
{
    let start = Instant::now();
    let mut summary = RunSummary::new(options.dry_run, options.filter_email.clone());
    info!(dry_run = options.dry_run, filter = ?options.filter_email, "starting enforcement run");

    let snapshot = match fetch_directory(directory, limits) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!(error = %format!("{err:#}"), "directory fetch failed; aborting run");
            summary.record_fatal(format!("{err:#}"));
            summary.finish(elapsed_ms(start));
            return summary;
        }
    };

    let candidates: Vec<&Member> = snapshot
        .candidates()
        .filter(|member| options.admits(&member.email))
        .collect();
    if options.filter_email.is_some() && candidates.is_empty() {
        info!("filter matched no candidate without a photo");
    }

    for member in candidates {
        process_member(enforcer, member, options.dry_run, &mut summary);
    }

    match enforcer.ledger().list_active() {
        Ok(records) => {
            for record in records {
                if !options.admits(&record.email) {
                    continue;
                }
                let Some(member) = snapshot.find_by_email(&record.email) else {
                    debug!(email = %record.email, "ledger member not in directory; skipping");
                    continue;
                };
                if member.has_photo {
                    process_member(enforcer, member, options.dry_run, &mut summary);
                }
            }
        }
        Err(err) => {
            error!(
                error = %format!("{err:#}"),
                "listing active warnings failed; photo-added pass skipped"
            );
            summary.record_fatal(format!("list active warnings: {err:#}"));
        }
    }

    summary.finish(elapsed_ms(start));
    info!(
        total = summary.total_members,
        processed = summary.processed,
        skipped = summary.skipped,
        errors = summary.errors,
        deactivations = summary.deactivations,
        duration_ms = summary.duration_ms,
        "enforcement run finished"
    );
    summary
}

fn process_member<L, M, D>(
    enforcer: &Enforcer<'_, L, M, D>,
    member: &Member,
    dry_run: bool,
    summary: &mut RunSummary,
) where
    L: WarningLedger,
    M: Messenger,
    D: Deactivator,
{
    let record = match enforcer.ledger().find(&member.email) {
        Ok(record) => record,
        Err(err) => {
            warn!(email = %member.email, error = %format!("{err:#}"), "ledger lookup failed");
            summary.record_failure(&member.email, format!("ledger lookup: {err:#}"));
            return;
        }
    };

    let decision = decide(member, record.as_ref());
    debug!(
        email = %member.email,
        action = %decision.action,
        level = decision.warning_level,
        reason = %decision.reason,
        "decision"
    );
    let result = enforcer.execute(member, record.as_ref(), &decision, dry_run);
    summary.record(&member.email, decision, result);
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
