//! Configuration file schema.
//!
//! Everything is optional in the file; defaults favor a local setup with a
//! JSON file store under the user's data directory and no credit metering.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration loaded from `bookwright.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub storage: StorageConfig,
    pub runtime: RuntimeConfig,
    pub approval: ApprovalConfig,
    pub credits: CreditsConfig,
    pub logging: LoggingConfig,
}

/// Where project state lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for project data. Defaults to
    /// `<data dir>/bookwright/projects`.
    pub root: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { root: None }
    }
}

impl StorageConfig {
    pub fn resolved_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("bookwright")
                .join("projects")
        })
    }
}

/// The agent runtime service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub base_url: String,
    /// Environment variable holding the API key; never the key itself.
    pub api_key_env: Option<String>,
    /// One HTTP round trip, in seconds.
    pub request_timeout_secs: u64,
    /// Whole-turn deadline, in seconds. 0 means unbounded.
    pub turn_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8700".to_string(),
            api_key_env: None,
            request_timeout_secs: 120,
            turn_timeout_secs: 900,
        }
    }
}

/// Which writes require a human decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// "post_hoc" (default) or "gated".
    pub policy: String,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            policy: "post_hoc".to_string(),
        }
    }
}

impl ApprovalConfig {
    pub fn parsed_policy(&self) -> bookwright_domain::ApprovalPolicy {
        match self.policy.as_str() {
            "gated" => bookwright_domain::ApprovalPolicy::GatedWrites,
            _ => bookwright_domain::ApprovalPolicy::PostHocReview,
        }
    }
}

/// Credit metering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditsConfig {
    pub enabled: bool,
    /// Starting balance for the local ledger when metering is enabled.
    pub balance: u64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            balance: 0,
        }
    }
}

/// Turn audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path to the JSONL turn log. `None` disables it.
    pub turn_log: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { turn_log: None }
    }
}
