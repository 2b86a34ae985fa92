//! Warning ledger contract and a JSON file store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::{WarningRecord, WarningStatus};
use crate::io::write_atomic;

/// Persisted per-member warning state.
///
/// Implementations hold at most one record per email (case-insensitive) and
/// assume a single writer.
pub trait WarningLedger {
    fn find(&self, email: &str) -> Result<Option<WarningRecord>>;

    /// Create a record at warning count 1.
    fn create(&self, name: &str, email: &str) -> Result<WarningRecord>;

    /// Bump the warning count and stamp today's date.
    fn increment_count(&self, id: &str) -> Result<WarningRecord>;

    fn set_status(&self, id: &str, status: WarningStatus) -> Result<WarningRecord>;

    fn delete(&self, id: &str) -> Result<()>;

    fn list_active(&self) -> Result<Vec<WarningRecord>>;
}

/// On-disk layout of the ledger file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub next_id: u64,
    pub records: Vec<WarningRecord>,
}

impl LedgerDocument {
    fn position(&self, id: &str) -> Result<usize> {
        self.records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| anyhow!("warning record {id} not found"))
    }

    fn find_email(&self, email: &str) -> Option<&WarningRecord> {
        self.records
            .iter()
            .find(|record| record.email.eq_ignore_ascii_case(email.trim()))
    }

    /// Create a record at count 1, rejecting a duplicate email.
    pub fn create(&mut self, name: &str, email: &str, today: NaiveDate) -> Result<WarningRecord> {
        if let Some(existing) = self.find_email(email) {
            bail!(
                "warning record {} already exists for {}",
                existing.id,
                existing.email
            );
        }
        self.next_id += 1;
        let record = WarningRecord {
            id: format!("w-{}", self.next_id),
            email: email.trim().to_string(),
            name: name.to_string(),
            warning_count: 1,
            status: WarningStatus::Active,
            last_warning_date: today,
        };
        self.records.push(record.clone());
        self.records.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(record)
    }

    pub fn increment_count(&mut self, id: &str, today: NaiveDate) -> Result<WarningRecord> {
        let idx = self.position(id)?;
        let record = &mut self.records[idx];
        record.warning_count += 1;
        record.last_warning_date = today;
        Ok(record.clone())
    }

    pub fn set_status(&mut self, id: &str, status: WarningStatus) -> Result<WarningRecord> {
        let idx = self.position(id)?;
        let record = &mut self.records[idx];
        record.status = status;
        Ok(record.clone())
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let idx = self.position(id)?;
        self.records.remove(idx);
        Ok(())
    }

    pub fn find(&self, email: &str) -> Option<WarningRecord> {
        self.find_email(email).cloned()
    }

    pub fn active(&self) -> Vec<WarningRecord> {
        self.records
            .iter()
            .filter(|record| record.status == WarningStatus::Active)
            .cloned()
            .collect()
    }
}

/// Ledger stored as a single JSON document, rewritten atomically on every mutation.
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: PathBuf,
}

impl JsonLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ledger. A missing file is an empty ledger.
    pub fn load(&self) -> Result<LedgerDocument> {
        if !self.path.exists() {
            return Ok(LedgerDocument::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("read ledger {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parse ledger {}", self.path.display()))
    }

    fn save(&self, doc: &LedgerDocument) -> Result<()> {
        debug!(path = %self.path.display(), records = doc.records.len(), "writing ledger");
        let mut buf = serde_json::to_string_pretty(doc).context("serialize ledger")?;
        buf.push('\n');
        write_atomic(&self.path, &buf)
    }

    fn mutate<T>(&self, apply: impl FnOnce(&mut LedgerDocument) -> Result<T>) -> Result<T> {
        let mut doc = self.load()?;
        let out = apply(&mut doc)?;
        self.save(&doc)?;
        Ok(out)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl WarningLedger for JsonLedger {
    fn find(&self, email: &str) -> Result<Option<WarningRecord>> {
        Ok(self.load()?.find(email))
    }

    fn create(&self, name: &str, email: &str) -> Result<WarningRecord> {
        self.mutate(|doc| doc.create(name, email, today()))
    }

    fn increment_count(&self, id: &str) -> Result<WarningRecord> {
        self.mutate(|doc| doc.increment_count(id, today()))
    }

    fn set_status(&self, id: &str, status: WarningStatus) -> Result<WarningRecord> {
        self.mutate(|doc| doc.set_status(id, status))
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.mutate(|doc| doc.delete(id))
    }

    fn list_active(&self) -> Result<Vec<WarningRecord>> {
        Ok(self.load()?.active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> (tempfile::TempDir, JsonLedger) {
        let temp = tempfile::tempdir().expect("tempdir");
        let ledger = JsonLedger::new(temp.path().join("state/warnings.json"));
        (temp, ledger)
    }

    #[test]
    fn missing_file_is_empty_ledger() {
        let (_temp, ledger) = ledger();
        assert!(ledger.find("a@example.com").expect("find").is_none());
        assert!(ledger.list_active().expect("list").is_empty());
    }

    #[test]
    fn create_then_escalate_persists_across_handles() {
        let (_temp, ledger) = ledger();
        let created = ledger.create("Ann", "ann@example.com").expect("create");
        assert_eq!(created.warning_count, 1);
        assert_eq!(created.status, WarningStatus::Active);
        assert_eq!(created.id, "w-1");

        let bumped = ledger.increment_count(&created.id).expect("increment");
        assert_eq!(bumped.warning_count, 2);

        let reopened = JsonLedger::new(ledger.path());
        let found = reopened
            .find("ANN@example.com")
            .expect("find")
            .expect("record");
        assert_eq!(found.warning_count, 2);
    }

    #[test]
    fn create_rejects_duplicate_email() {
        let (_temp, ledger) = ledger();
        ledger.create("Ann", "ann@example.com").expect("create");
        let err = ledger.create("Ann", "Ann@Example.com").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn deactivated_records_are_not_listed_as_active() {
        let (_temp, ledger) = ledger();
        let ann = ledger.create("Ann", "ann@example.com").expect("create");
        ledger.create("Ben", "ben@example.com").expect("create");
        ledger
            .set_status(&ann.id, WarningStatus::Deactivated)
            .expect("set status");

        let active = ledger.list_active().expect("list");
        let emails: Vec<&str> = active.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(emails, vec!["ben@example.com"]);
    }

    #[test]
    fn delete_removes_record_and_unknown_id_errors() {
        let (_temp, ledger) = ledger();
        let ann = ledger.create("Ann", "ann@example.com").expect("create");
        ledger.delete(&ann.id).expect("delete");
        assert!(ledger.find("ann@example.com").expect("find").is_none());

        let err = ledger.delete(&ann.id).unwrap_err();
        assert_eq!(err.to_string(), "warning record w-1 not found");
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (_temp, ledger) = ledger();
        let ann = ledger.create("Ann", "ann@example.com").expect("create");
        ledger.delete(&ann.id).expect("delete");
        let again = ledger.create("Ann", "ann@example.com").expect("create");
        assert_eq!(again.id, "w-2");
    }

    #[test]
    fn ledger_file_uses_screaming_status_tags() {
        let (_temp, ledger) = ledger();
        ledger.create("Ann", "ann@example.com").expect("create");
        let contents = fs::read_to_string(ledger.path()).expect("read");
        assert!(contents.contains("\"status\": \"ACTIVE\""), "{contents}");
        assert!(contents.ends_with('\n'));
    }
}
