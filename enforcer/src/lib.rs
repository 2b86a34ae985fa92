//! Progressive enforcement of the community profile-photo rule.
//!
//! Members without a profile photo climb a fixed ladder: four warnings, then
//! deactivation. Members who add a photo are thanked and dropped from the
//! ledger. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (decisions, step plans, run summaries).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting seams (member directory, warning ledger, messaging,
//!   deactivation) and their concrete adapters.
//!
//! Orchestration modules ([`execute`], [`run`]) coordinate core logic with I/O
//! to implement CLI commands.

pub mod core;
pub mod execute;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
