//! Test-only fixtures and scripted collaborators.

use std::cell::{Cell, RefCell};

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use crate::core::types::{Member, WarningRecord, WarningStatus};
use crate::io::directory::MemberDirectory;
use crate::io::ledger::{LedgerDocument, WarningLedger};
use crate::io::messenger::{Deactivator, MessageOutcome, Messenger};

/// Date stamped on every fixture record and in-memory ledger write.
pub fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid fixture date")
}

/// Create a member whose name is derived from the email's local part.
pub fn member(id: &str, email: &str, has_photo: bool) -> Member {
    let name = email.split('@').next().unwrap_or(email).to_string();
    Member {
        id: id.to_string(),
        email: email.to_string(),
        name,
        has_photo,
    }
}

/// Create a detached ledger record (not stored anywhere).
pub fn record(email: &str, warning_count: u32, status: WarningStatus) -> WarningRecord {
    WarningRecord {
        id: format!("w-{}", email.split('@').next().unwrap_or(email)),
        email: email.to_string(),
        name: email.to_string(),
        warning_count,
        status,
        last_warning_date: fixture_date(),
    }
}

/// Ledger backed by an in-memory [`LedgerDocument`], with write counters.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    doc: RefCell<LedgerDocument>,
    writes: Cell<usize>,
    status_updates: Cell<usize>,
    fail_writes: bool,
    fail_finds: Vec<String>,
    fail_list_active: bool,
}

impl InMemoryLedger {
    /// Every mutation fails.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// `find` fails for the given emails.
    pub fn failing_finds(mut self, emails: &[&str]) -> Self {
        self.fail_finds = emails.iter().map(|email| email.to_string()).collect();
        self
    }

    /// `list_active` fails.
    pub fn failing_list_active(mut self) -> Self {
        self.fail_list_active = true;
        self
    }

    /// Insert a record directly, bypassing the write counters.
    pub fn seed(
        &self,
        name: &str,
        email: &str,
        count: u32,
        status: WarningStatus,
    ) -> WarningRecord {
        let mut doc = self.doc.borrow_mut();
        let mut created = doc
            .create(name, email, fixture_date())
            .expect("seed record");
        created = doc
            .set_status(&created.id, status)
            .expect("seed status");
        let idx = doc
            .records
            .iter()
            .position(|record| record.id == created.id)
            .expect("seeded record");
        doc.records[idx].warning_count = count;
        created.warning_count = count;
        created
    }

    pub fn records(&self) -> Vec<WarningRecord> {
        self.doc.borrow().records.clone()
    }

    /// Number of successful mutations.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn status_updates(&self) -> usize {
        self.status_updates.get()
    }

    fn write<T>(&self, apply: impl FnOnce(&mut LedgerDocument) -> Result<T>) -> Result<T> {
        if self.fail_writes {
            return Err(anyhow!("ledger unavailable"));
        }
        let out = apply(&mut *self.doc.borrow_mut())?;
        self.writes.set(self.writes.get() + 1);
        Ok(out)
    }
}

impl WarningLedger for InMemoryLedger {
    fn find(&self, email: &str) -> Result<Option<WarningRecord>> {
        if self.fail_finds.iter().any(|failing| failing == email) {
            return Err(anyhow!("ledger lookup failed for {email}"));
        }
        Ok(self.doc.borrow().find(email))
    }

    fn create(&self, name: &str, email: &str) -> Result<WarningRecord> {
        self.write(|doc| doc.create(name, email, fixture_date()))
    }

    fn increment_count(&self, id: &str) -> Result<WarningRecord> {
        self.write(|doc| doc.increment_count(id, fixture_date()))
    }

    fn set_status(&self, id: &str, status: WarningStatus) -> Result<WarningRecord> {
        let updated = self.write(|doc| doc.set_status(id, status))?;
        self.status_updates.set(self.status_updates.get() + 1);
        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.write(|doc| doc.delete(id))
    }

    fn list_active(&self) -> Result<Vec<WarningRecord>> {
        if self.fail_list_active {
            return Err(anyhow!("ledger unavailable"));
        }
        Ok(self.doc.borrow().active())
    }
}

/// Directory serving a fixed member list in pages.
#[derive(Debug, Default)]
pub struct ScriptedDirectory {
    members: Vec<Member>,
    pages: RefCell<Vec<u32>>,
    fail_page: Option<u32>,
}

impl ScriptedDirectory {
    pub fn new(members: Vec<Member>) -> Self {
        Self {
            members,
            ..Self::default()
        }
    }

    pub fn failing_on_page(mut self, page: u32) -> Self {
        self.fail_page = Some(page);
        self
    }

    /// Pages requested so far, in order.
    pub fn pages_requested(&self) -> Vec<u32> {
        self.pages.borrow().clone()
    }
}

impl MemberDirectory for ScriptedDirectory {
    fn list_page(&self, page: u32, per_page: u32) -> Result<Vec<Member>> {
        self.pages.borrow_mut().push(page);
        if self.fail_page == Some(page) {
            return Err(anyhow!("directory unavailable"));
        }
        let per_page = per_page as usize;
        let start = (page.saturating_sub(1) as usize) * per_page;
        Ok(self
            .members
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect())
    }

    fn fetch_member(&self, id: &str) -> Result<Member> {
        self.members
            .iter()
            .find(|member| member.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("member {id} not found"))
    }
}

/// Messenger that records every message and fails for chosen recipients.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: RefCell<Vec<(String, String)>>,
    failing: Vec<String>,
}

impl RecordingMessenger {
    pub fn failing_for(member_ids: &[&str]) -> Self {
        Self {
            failing: member_ids.iter().map(|id| id.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Delivered `(recipient_id, body)` pairs.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }
}

impl Messenger for RecordingMessenger {
    fn send_direct_message(&self, member_id: &str, body: &str) -> MessageOutcome {
        if self.failing.iter().any(|id| id == member_id) {
            return MessageOutcome::failed("recipient unreachable");
        }
        self.sent
            .borrow_mut()
            .push((member_id.to_string(), body.to_string()));
        MessageOutcome::delivered()
    }
}

/// Deactivator that either records ids or fails with a fixed message.
#[derive(Debug, Default)]
pub struct ScriptedDeactivator {
    deactivated: RefCell<Vec<String>>,
    error: Option<String>,
}

impl ScriptedDeactivator {
    pub fn failing(error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn deactivated(&self) -> Vec<String> {
        self.deactivated.borrow().clone()
    }
}

impl Deactivator for ScriptedDeactivator {
    fn deactivate(&self, member_id: &str) -> Result<()> {
        if let Some(error) = &self.error {
            return Err(anyhow!("{error}"));
        }
        self.deactivated.borrow_mut().push(member_id.to_string());
        Ok(())
    }
}
