//! Enforcer configuration stored in `enforcer.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::directory::FetchLimits;
use crate::io::write_atomic;

pub const DEFAULT_CONFIG_PATH: &str = "enforcer.toml";

/// Enforcer configuration (TOML).
///
/// Missing fields default to the values below. The API token is never stored
/// here; `api.token_env` names the environment variable holding it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnforcerConfig {
    /// Member id that receives admin alerts.
    pub admin_member_id: String,
    pub api: ApiConfig,
    pub limits: LimitsConfig,
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    pub page_size: u32,
    pub warn_members: usize,
    pub max_members: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LedgerConfig {
    pub path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://community.example.com/api/v1".to_string(),
            token_env: "COMMUNITY_API_TOKEN".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = FetchLimits::default();
        Self {
            page_size: limits.page_size,
            warn_members: limits.warn_members,
            max_members: limits.max_members,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".enforcer/warnings.json"),
        }
    }
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self {
            admin_member_id: String::new(),
            api: ApiConfig::default(),
            limits: LimitsConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl LimitsConfig {
    pub fn fetch_limits(&self) -> FetchLimits {
        FetchLimits {
            page_size: self.page_size,
            warn_members: self.warn_members,
            max_members: self.max_members,
        }
    }
}

impl EnforcerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(anyhow!("api.base_url must be set"));
        }
        if self.api.token_env.trim().is_empty() {
            return Err(anyhow!("api.token_env must be set"));
        }
        if self.api.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be > 0"));
        }
        if self.limits.page_size == 0 {
            return Err(anyhow!("limits.page_size must be > 0"));
        }
        if self.limits.warn_members >= self.limits.max_members {
            return Err(anyhow!(
                "limits.warn_members ({}) must be below limits.max_members ({})",
                self.limits.warn_members,
                self.limits.max_members
            ));
        }
        Ok(())
    }

    /// Checks needed before anything is sent or mutated.
    pub fn validate_for_execution(&self) -> Result<()> {
        self.validate()?;
        if self.admin_member_id.trim().is_empty() {
            return Err(anyhow!("admin_member_id must be set to receive admin alerts"));
        }
        Ok(())
    }

    /// Read the API token from the configured environment variable.
    pub fn api_token(&self) -> Result<String> {
        let token = std::env::var(&self.api.token_env)
            .with_context(|| format!("read API token from ${}", self.api.token_env))?;
        if token.trim().is_empty() {
            return Err(anyhow!("${} is empty", self.api.token_env));
        }
        Ok(token)
    }

    /// Resolve the ledger path relative to the config file's directory.
    pub fn ledger_path(&self, config_path: &Path) -> PathBuf {
        if self.ledger.path.is_absolute() {
            return self.ledger.path.clone();
        }
        match config_path.parent() {
            Some(dir) => dir.join(&self.ledger.path),
            None => self.ledger.path.clone(),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EnforcerConfig::default()`.
pub fn load_config(path: &Path) -> Result<EnforcerConfig> {
    if !path.exists() {
        let cfg = EnforcerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EnforcerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &EnforcerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}
