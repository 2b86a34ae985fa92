//! Notification and deactivation seams.
//!
//! [`Messenger`] never fails: delivery problems come back as a
//! [`MessageOutcome`] so the orchestrator decides how much they matter.

use anyhow::Result;
use serde::Serialize;

/// Delivery result of a direct message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl MessageOutcome {
    pub fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

pub trait Messenger {
    fn send_direct_message(&self, member_id: &str, body: &str) -> MessageOutcome;
}

pub trait Deactivator {
    /// Deactivate the member's account. Errors mean the account is still active.
    fn deactivate(&self, member_id: &str) -> Result<()>;
}
