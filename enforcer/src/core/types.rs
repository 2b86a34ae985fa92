//! Shared deterministic types for the enforcement engine.
//!
//! These types define stable contracts between the decision engine, the
//! orchestrator and the run aggregator. They carry no I/O handles.

use std::fmt;
use std::str::FromStr;

use anyhow::{Error, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity snapshot of a community member, fetched fresh on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub email: String,
    pub name: String,
    pub has_photo: bool,
}

impl Member {
    /// Case-insensitive email comparison used by the filter and photo-added pass.
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

/// Persisted state of a warning record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningStatus {
    Active,
    PhotoAdded,
    Deactivated,
}

impl WarningStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningStatus::Active => "ACTIVE",
            WarningStatus::PhotoAdded => "PHOTO_ADDED",
            WarningStatus::Deactivated => "DEACTIVATED",
        }
    }
}

impl fmt::Display for WarningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WarningStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ACTIVE" => Ok(WarningStatus::Active),
            "PHOTO_ADDED" => Ok(WarningStatus::PhotoAdded),
            "DEACTIVATED" => Ok(WarningStatus::Deactivated),
            other => Err(anyhow!("invalid warning status: {other}")),
        }
    }
}

/// Ledger entry tracking how often a member has been warned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningRecord {
    /// Storage handle assigned by the ledger.
    pub id: String,
    pub email: String,
    pub name: String,
    pub warning_count: u32,
    pub status: WarningStatus,
    pub last_warning_date: NaiveDate,
}

/// The single next step chosen for a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    CreateWarning,
    IncrementWarning,
    Deactivate,
    PhotoAdded,
    Skip,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::CreateWarning => "CREATE_WARNING",
            Action::IncrementWarning => "INCREMENT_WARNING",
            Action::Deactivate => "DEACTIVATE",
            Action::PhotoAdded => "PHOTO_ADDED",
            Action::Skip => "SKIP",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CREATE_WARNING" => Ok(Action::CreateWarning),
            "INCREMENT_WARNING" => Ok(Action::IncrementWarning),
            "DEACTIVATE" => Ok(Action::Deactivate),
            "PHOTO_ADDED" => Ok(Action::PhotoAdded),
            "SKIP" => Ok(Action::Skip),
            other => Err(anyhow!("unknown action: {other}")),
        }
    }
}

/// Output of the decision engine. A pure function of member and record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    /// Ladder position this decision corresponds to (0-5).
    pub warning_level: u32,
    pub should_notify_admin: bool,
    /// Human-readable justification. Asserted verbatim by tests.
    pub reason: String,
}

/// Outcome of executing a decision's side effects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Tags of the sub-steps that completed, in execution order.
    pub executed_actions: Vec<String>,
    /// Sub-step failures. May be non-empty even when `success` is true.
    pub errors: Vec<String>,
}

impl ExecutionResult {
    pub fn dry_run(action: Action) -> Self {
        Self {
            success: true,
            executed_actions: vec![format!("DRY_RUN:{action}")],
            errors: Vec::new(),
        }
    }
}
