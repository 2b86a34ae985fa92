//! CLI tests for the `enforcer` binary.
//!
//! Spawns the binary in a temp dir and checks exit codes and side effects for
//! the commands that need no network access.

use std::process::{Command, Output};

use enforcer::exit_codes;
use enforcer::io::config::{DEFAULT_CONFIG_PATH, load_config};

fn enforcer(dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_enforcer"))
        .current_dir(dir)
        .env_remove("COMMUNITY_API_TOKEN")
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("spawn enforcer")
}

#[test]
fn init_writes_default_config() {
    let temp = tempfile::tempdir().expect("tempdir");

    let out = enforcer(temp.path(), &["init"]);

    assert_eq!(out.status.code(), Some(exit_codes::OK));
    let cfg = load_config(&temp.path().join(DEFAULT_CONFIG_PATH)).expect("load");
    assert_eq!(cfg.limits.max_members, 1000);
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let temp = tempfile::tempdir().expect("tempdir");
    assert_eq!(enforcer(temp.path(), &["init"]).status.code(), Some(exit_codes::OK));

    let again = enforcer(temp.path(), &["init"]);
    assert_eq!(again.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&again.stderr).contains("already exists"));

    let forced = enforcer(temp.path(), &["init", "--force"]);
    assert_eq!(forced.status.code(), Some(exit_codes::OK));
}

#[test]
fn run_without_admin_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");

    let out = enforcer(temp.path(), &["run"]);

    assert_eq!(out.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&out.stderr).contains("admin_member_id"));
}

#[test]
fn dry_run_without_token_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");

    let out = enforcer(temp.path(), &["run", "--dry-run"]);

    assert_eq!(out.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&out.stderr).contains("COMMUNITY_API_TOKEN"));
}

#[test]
fn ledger_on_fresh_workspace_is_empty() {
    let temp = tempfile::tempdir().expect("tempdir");

    let out = enforcer(temp.path(), &["ledger"]);

    assert_eq!(out.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "[]");
}
