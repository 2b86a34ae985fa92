//! Member directory fetching with population safety limits.
//!
//! The directory is paged until a short page comes back. The running total is
//! checked against [`FetchLimits`] after every page and before any filtering,
//! so an upstream that ignores paging or returns the whole community trips the
//! breaker even when every member has a photo.

use std::fmt;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::core::types::Member;

/// Source of community members.
pub trait MemberDirectory {
    /// Fetch one page (1-indexed) of at most `per_page` members.
    fn list_page(&self, page: u32, per_page: u32) -> Result<Vec<Member>>;

    /// Fetch a single member by id.
    fn fetch_member(&self, id: &str) -> Result<Member>;
}

/// Pagination and population limits for a directory fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub page_size: u32,
    /// Log a warning once this many members have been fetched.
    pub warn_members: usize,
    /// Abort the fetch once this many members have been fetched.
    pub max_members: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            page_size: 100,
            warn_members: 500,
            max_members: 1000,
        }
    }
}

/// Raised when the directory returns more members than the configured maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyLimitError {
    pub found: usize,
    pub max: usize,
}

impl fmt::Display for SafetyLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "safety limit exceeded: directory returned {} members (maximum {}); \
             refusing to enforce against this population. If the community really is this \
             large, raise `limits.max_members` in the config file",
            self.found, self.max
        )
    }
}

impl std::error::Error for SafetyLimitError {}

/// Request-scoped copy of the directory for one run.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    members: Vec<Member>,
}

impl DirectorySnapshot {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members lacking a profile photo.
    pub fn candidates(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|member| !member.has_photo)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.email_matches(email))
    }
}

/// Page through the whole directory, enforcing `limits`.
pub fn fetch_directory<D: MemberDirectory>(
    directory: &D,
    limits: &FetchLimits,
) -> Result<DirectorySnapshot> {
    let mut members = Vec::new();
    let mut page = 1u32;
    loop {
        let batch = directory
            .list_page(page, limits.page_size)
            .with_context(|| format!("fetch member page {page}"))?;
        let full = batch.len() == limits.page_size as usize;
        debug!(page, count = batch.len(), "fetched member page");
        members.extend(batch);
        if members.len() >= limits.max_members {
            return Err(SafetyLimitError {
                found: members.len(),
                max: limits.max_members,
            }
            .into());
        }
        if !full {
            break;
        }
        page += 1;
    }

    let total = members.len();
    if total >= limits.warn_members {
        warn!(
            total,
            max = limits.max_members,
            "approaching safety limit: directory returned an unusually large population"
        );
    }

    let snapshot = DirectorySnapshot::new(members);
    info!(
        total,
        pages = page,
        candidates = snapshot.candidates().count(),
        "directory fetched"
    );
    Ok(snapshot)
}

/// Members lacking a profile photo.
pub fn fetch_candidates<D: MemberDirectory>(
    directory: &D,
    limits: &FetchLimits,
) -> Result<Vec<Member>> {
    let snapshot = fetch_directory(directory, limits)?;
    Ok(snapshot.candidates().cloned().collect())
}
