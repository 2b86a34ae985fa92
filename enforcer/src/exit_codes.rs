//! Stable exit codes for enforcer CLI commands.

/// Command succeeded; every member was handled without a blocking failure.
pub const OK: i32 = 0;
/// Command failed due to invalid config, missing credentials or other setup errors.
pub const INVALID: i32 = 1;
/// `enforcer run` aborted before enforcing (e.g. the population safety limit tripped).
pub const ABORTED: i32 = 2;
/// `enforcer run` finished but at least one member's action failed.
pub const PARTIAL: i32 = 3;
