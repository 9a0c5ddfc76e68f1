use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use likeledger_store::{CorruptSnapshotPolicy, FileSnapshotStore, LedgerOptions};
use likeledger_types::IdentityPolicy;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Top-level configuration for the like ledger server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Location of the durable snapshot.
    #[serde(default = "FileSnapshotStore::default_path")]
    pub snapshot_path: PathBuf,

    /// How liker identities are compared: "exact" or "case_insensitive".
    #[serde(default)]
    pub identity_policy: IdentityPolicy,

    /// Startup behaviour for an unreadable snapshot: "quarantine" or "fail".
    #[serde(default)]
    pub on_corrupt: CorruptSnapshotPolicy,

    /// Snapshot write attempts per like, including the first.
    #[serde(default = "default_persist_attempts")]
    pub persist_attempts: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound on one snapshot write.
    #[serde(default = "default_persist_timeout_ms")]
    pub persist_timeout_ms: u64,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3001))
}

fn default_persist_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    50
}

fn default_persist_timeout_ms() -> u64 {
    5_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            snapshot_path: FileSnapshotStore::default_path(),
            identity_policy: IdentityPolicy::default(),
            on_corrupt: CorruptSnapshotPolicy::default(),
            persist_attempts: default_persist_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            persist_timeout_ms: default_persist_timeout_ms(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file. Returns default if not found.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.persist_attempts >= 1, "persist_attempts must be at least 1");
        anyhow::ensure!(self.persist_timeout_ms >= 1, "persist_timeout_ms must be positive");
        Ok(())
    }

    pub fn ledger_options(&self) -> LedgerOptions {
        LedgerOptions {
            identity_policy: self.identity_policy,
            on_corrupt: self.on_corrupt,
            persist_attempts: self.persist_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            persist_timeout: Duration::from_millis(self.persist_timeout_ms),
        }
    }
}
