//! Engine configuration
//!
//! Loaded from a JSON file; every field falls back to its default when
//! omitted.

use keygate_core::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for the authorization engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The identity's own address. Executions targeting it are self-calls.
    #[serde(default = "default_identity_address")]
    pub identity_address: String,

    /// Initial number of distinct approvals an execution needs
    #[serde(default = "default_required_approvals")]
    pub required_approvals: u32,

    /// Directory for the JSONL audit log
    #[serde(default = "default_audit_dir")]
    pub audit_dir: PathBuf,
}

fn default_identity_address() -> String {
    "keygate:identity".to_string()
}

fn default_required_approvals() -> u32 {
    1
}

fn default_audit_dir() -> PathBuf {
    PathBuf::from("./data/audit")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            identity_address: default_identity_address(),
            required_approvals: default_required_approvals(),
            audit_dir: default_audit_dir(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn address(&self) -> Address {
        Address::new(self.identity_address.clone())
    }
}
