//! Deterministic escalation ladder.

use crate::core::types::{Action, Decision, Member, WarningRecord, WarningStatus};

/// Warning level at which the member is deactivated.
pub const DEACTIVATION_LEVEL: u32 = 5;
/// Last warning sent before deactivation. Admins are alerted from here on.
pub const FINAL_WARNING_LEVEL: u32 = 4;

/// Map a member and their ledger record to exactly one next action.
///
/// Rules are evaluated top to bottom and the first match wins:
///
/// 1. photo + live record -> `PHOTO_ADDED`
/// 2. photo -> `SKIP`
/// 3. no record -> `CREATE_WARNING` (level 1)
/// 4. deactivated -> `SKIP`
/// 5. stale photo-added record -> `SKIP`
/// 6. active record already at or past level 5 -> `SKIP` + admin anomaly alert
/// 7. next level is 5 -> `DEACTIVATE`
/// 8. next level is 4 -> `INCREMENT_WARNING` + admin alert
/// 9. otherwise -> `INCREMENT_WARNING`
pub fn decide(member: &Member, record: Option<&WarningRecord>) -> Decision {
    if member.has_photo {
        return match record {
            Some(record) if record.status != WarningStatus::PhotoAdded => decision(
                Action::PhotoAdded,
                0,
                false,
                format!(
                    "Member added a profile photo after {} warning(s)",
                    record.warning_count
                ),
            ),
            _ => decision(Action::Skip, 0, false, "Member has a profile photo".to_string()),
        };
    }

    let Some(record) = record else {
        return decision(
            Action::CreateWarning,
            1,
            false,
            format!("No profile photo and no prior warnings: sending warning 1 of {FINAL_WARNING_LEVEL}"),
        );
    };

    let count = record.warning_count;
    match record.status {
        WarningStatus::Deactivated => {
            return decision(
                Action::Skip,
                count,
                false,
                format!("Member already deactivated after {count} warning(s)"),
            );
        }
        WarningStatus::PhotoAdded => {
            return decision(
                Action::Skip,
                count,
                false,
                "Warning record already marked photo added; awaiting cleanup".to_string(),
            );
        }
        WarningStatus::Active => {}
    }

    if count >= DEACTIVATION_LEVEL {
        return decision(
            Action::Skip,
            DEACTIVATION_LEVEL,
            true,
            format!("Anomaly detected: warning count is {count} but status is still ACTIVE"),
        );
    }

    let next = count + 1;
    if next == DEACTIVATION_LEVEL {
        decision(
            Action::Deactivate,
            DEACTIVATION_LEVEL,
            true,
            format!("Warning {DEACTIVATION_LEVEL} reached after {count} prior warnings: deactivating member"),
        )
    } else if next == FINAL_WARNING_LEVEL {
        decision(
            Action::IncrementWarning,
            FINAL_WARNING_LEVEL,
            true,
            format!("Final warning ({FINAL_WARNING_LEVEL} of {FINAL_WARNING_LEVEL}) before deactivation"),
        )
    } else {
        decision(
            Action::IncrementWarning,
            next,
            false,
            format!("No profile photo: sending warning {next} of {FINAL_WARNING_LEVEL}"),
        )
    }
}

fn decision(
    action: Action,
    warning_level: u32,
    should_notify_admin: bool,
    reason: String,
) -> Decision {
    Decision {
        action,
        warning_level,
        should_notify_admin,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{member, record};

    #[test]
    fn photo_without_record_is_skipped() {
        let got = decide(&member("1", "a@example.com", true), None);
        assert_eq!(got.action, Action::Skip);
        assert_eq!(got.warning_level, 0);
        assert!(!got.should_notify_admin);
        assert_eq!(got.reason, "Member has a profile photo");
    }

    #[test]
    fn photo_with_active_record_is_photo_added() {
        for count in 1..=4 {
            let rec = record("a@example.com", count, WarningStatus::Active);
            let got = decide(&member("1", "a@example.com", true), Some(&rec));
            assert_eq!(got.action, Action::PhotoAdded);
            assert_eq!(got.warning_level, 0);
            assert!(!got.should_notify_admin);
        }
    }

    #[test]
    fn photo_with_deactivated_record_is_photo_added() {
        let rec = record("a@example.com", 5, WarningStatus::Deactivated);
        let got = decide(&member("1", "a@example.com", true), Some(&rec));
        assert_eq!(got.action, Action::PhotoAdded);
        assert_eq!(got.reason, "Member added a profile photo after 5 warning(s)");
    }

    #[test]
    fn photo_with_stale_photo_added_record_is_skipped() {
        let rec = record("a@example.com", 2, WarningStatus::PhotoAdded);
        let got = decide(&member("1", "a@example.com", true), Some(&rec));
        assert_eq!(got.action, Action::Skip);
        assert_eq!(got.warning_level, 0);
    }

    #[test]
    fn ladder_escalates_one_level_at_a_time() {
        let m = member("1", "a@example.com", false);

        let first = decide(&m, None);
        assert_eq!(
            (first.action, first.warning_level, first.should_notify_admin),
            (Action::CreateWarning, 1, false)
        );
        assert_eq!(
            first.reason,
            "No profile photo and no prior warnings: sending warning 1 of 4"
        );

        let expected = [
            (1, Action::IncrementWarning, 2, false),
            (2, Action::IncrementWarning, 3, false),
            (3, Action::IncrementWarning, 4, true),
            (4, Action::Deactivate, 5, true),
        ];
        for (count, action, level, notify) in expected {
            let rec = record("a@example.com", count, WarningStatus::Active);
            let got = decide(&m, Some(&rec));
            assert_eq!(
                (got.action, got.warning_level, got.should_notify_admin),
                (action, level, notify),
                "count {count}"
            );
        }
    }

    #[test]
    fn reasons_describe_each_rung() {
        let m = member("1", "a@example.com", false);
        let second = decide(&m, Some(&record("a@example.com", 1, WarningStatus::Active)));
        assert_eq!(second.reason, "No profile photo: sending warning 2 of 4");
        let last = decide(&m, Some(&record("a@example.com", 3, WarningStatus::Active)));
        assert_eq!(last.reason, "Final warning (4 of 4) before deactivation");
        let deactivate = decide(&m, Some(&record("a@example.com", 4, WarningStatus::Active)));
        assert_eq!(
            deactivate.reason,
            "Warning 5 reached after 4 prior warnings: deactivating member"
        );
    }

    #[test]
    fn deactivated_record_is_terminal() {
        let rec = record("a@example.com", 5, WarningStatus::Deactivated);
        let got = decide(&member("1", "a@example.com", false), Some(&rec));
        assert_eq!(got.action, Action::Skip);
        assert_eq!(got.warning_level, 5);
        assert!(!got.should_notify_admin);
        assert_eq!(got.reason, "Member already deactivated after 5 warning(s)");
    }

    #[test]
    fn stale_photo_added_record_without_photo_is_skipped() {
        let rec = record("a@example.com", 2, WarningStatus::PhotoAdded);
        let got = decide(&member("1", "a@example.com", false), Some(&rec));
        assert_eq!(got.action, Action::Skip);
        assert_eq!(got.warning_level, 2);
        assert!(!got.should_notify_admin);
    }

    #[test]
    fn corrupted_count_flags_anomaly() {
        let rec = record("a@example.com", 7, WarningStatus::Active);
        let got = decide(&member("1", "a@example.com", false), Some(&rec));
        assert_eq!(got.action, Action::Skip);
        assert_eq!(got.warning_level, 5);
        assert!(got.should_notify_admin);
        assert!(got.reason.contains("Anomaly detected"));
        assert!(got.reason.contains('7'));
    }

    #[test]
    fn active_record_at_five_is_an_anomaly_not_a_second_deactivation() {
        let rec = record("a@example.com", 5, WarningStatus::Active);
        let got = decide(&member("1", "a@example.com", false), Some(&rec));
        assert_eq!(got.action, Action::Skip);
        assert!(got.should_notify_admin);
    }

    #[test]
    fn zero_count_active_record_restarts_at_level_one() {
        let rec = record("a@example.com", 0, WarningStatus::Active);
        let got = decide(&member("1", "a@example.com", false), Some(&rec));
        assert_eq!(got.action, Action::IncrementWarning);
        assert_eq!(got.warning_level, 1);
    }

    #[test]
    fn decide_is_deterministic() {
        let m = member("1", "a@example.com", false);
        let rec = record("a@example.com", 2, WarningStatus::Active);
        assert_eq!(decide(&m, Some(&rec)), decide(&m, Some(&rec)));
    }
}
