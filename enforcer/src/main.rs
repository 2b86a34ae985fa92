//! Profile-photo enforcer CLI.
//!
//! Runs the warning ladder against the community directory, keeping warning
//! state in a JSON ledger next to the config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use enforcer::core::decision::decide;
use enforcer::core::summary::RunSummary;
use enforcer::core::types::{Decision, Member, WarningRecord};
use enforcer::execute::Enforcer;
use enforcer::exit_codes;
use enforcer::io::community_api::{CommunityApi, CommunityApiConfig};
use enforcer::io::config::{DEFAULT_CONFIG_PATH, EnforcerConfig, load_config, write_config};
use enforcer::io::directory::MemberDirectory;
use enforcer::io::ledger::{JsonLedger, WarningLedger};
use enforcer::logging;
use enforcer::run::{RunOptions, run_enforcement};

#[derive(Parser)]
#[command(
    name = "enforcer",
    version,
    about = "Progressive profile-photo enforcement for community members"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Run the enforcement sweep and print the run summary as JSON.
    Run {
        /// Decide for every member without mutating the ledger or sending messages.
        #[arg(long)]
        dry_run: bool,
        /// Only consider the member with this email.
        #[arg(long)]
        email: Option<String>,
    },
    /// Show the decision for one member without executing it.
    Inspect {
        /// Member id in the community directory.
        member_id: String,
    },
    /// Print every warning record in the ledger.
    Ledger,
}

#[derive(Serialize)]
struct Inspection {
    member: Member,
    record: Option<WarningRecord>,
    decision: Decision,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Command::Init { force } => cmd_init(&cli.config, *force),
        Command::Run { dry_run, email } => cmd_run(&cli.config, *dry_run, email.clone()),
        Command::Inspect { member_id } => cmd_inspect(&cli.config, member_id),
        Command::Ledger => cmd_ledger(&cli.config),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    write_config(config_path, &EnforcerConfig::default())?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

fn cmd_run(config_path: &Path, dry_run: bool, email: Option<String>) -> Result<i32> {
    let cfg = load_config(config_path)?;
    if !dry_run {
        cfg.validate_for_execution()?;
    }
    let api = community_api(&cfg)?;
    let ledger = JsonLedger::new(cfg.ledger_path(config_path));
    let enforcer = Enforcer::new(&ledger, &api, &api, cfg.admin_member_id.clone());

    let summary = run_enforcement(
        &api,
        &enforcer,
        &cfg.limits.fetch_limits(),
        &RunOptions {
            dry_run,
            filter_email: email,
        },
    );
    print_json(&summary)?;
    Ok(summary_exit_code(&summary))
}

fn cmd_inspect(config_path: &Path, member_id: &str) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let api = community_api(&cfg)?;
    let ledger = JsonLedger::new(cfg.ledger_path(config_path));

    let member = api
        .fetch_member(member_id)
        .with_context(|| format!("fetch member {member_id}"))?;
    let record = ledger.find(&member.email)?;
    let decision = decide(&member, record.as_ref());
    print_json(&Inspection {
        member,
        record,
        decision,
    })?;
    Ok(exit_codes::OK)
}

fn cmd_ledger(config_path: &Path) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let ledger = JsonLedger::new(cfg.ledger_path(config_path));
    let doc = ledger.load()?;
    print_json(&doc.records)?;
    Ok(exit_codes::OK)
}

fn community_api(cfg: &EnforcerConfig) -> Result<CommunityApi> {
    CommunityApi::new(CommunityApiConfig {
        base_url: cfg.api.base_url.clone(),
        token: cfg.api_token()?,
        timeout: Duration::from_secs(cfg.api.timeout_secs),
    })
}

fn summary_exit_code(summary: &RunSummary) -> i32 {
    if summary.is_aborted() {
        exit_codes::ABORTED
    } else if summary.errors > 0 {
        exit_codes::PARTIAL
    } else {
        exit_codes::OK
    }
}

/// Print `value` as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
