//! Scripted scenarios for `keygate run`
//!
//! A scenario names keys by label. A label that parses as a 64-character hex
//! key id is used as-is; anything else is hashed into a `KeyId`, so the same
//! label always yields the same key.
//!
//! ```json
//! {
//!   "management_key": "root",
//!   "reserve": "10",
//!   "steps": [
//!     { "op": "add_key", "caller": "root", "key": "alice", "purpose": "action" },
//!     { "op": "set_required_approvals", "caller": "root", "required": 2 },
//!     { "op": "execute", "caller": "alice", "target": "wallet", "value": "0.1" },
//!     { "op": "approve", "caller": "alice", "execution": 1 },
//!     { "op": "approve", "caller": "root", "execution": 1 }
//!   ]
//! }
//! ```

use anyhow::Context;
use keygate_core::{Amount, ExecutionId, KeyId, KeyType, Purpose};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Label of the identity's initial management key
    pub management_key: String,

    /// Management key algorithm
    #[serde(default)]
    pub key_type: KeyType,

    /// Funds available to transfers through the in-memory ledger
    #[serde(default)]
    pub reserve: Amount,

    /// Overrides the configured initial threshold
    #[serde(default)]
    pub required_approvals: Option<u32>,

    pub steps: Vec<Step>,
}

/// One scripted operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Propose an execution against an arbitrary target
    Execute {
        caller: String,
        target: String,
        #[serde(default)]
        value: Amount,
        /// UTF-8 payload
        #[serde(default)]
        payload: String,
    },

    /// Propose a self-call adding a purpose to a key
    AddKey {
        caller: String,
        key: String,
        purpose: Purpose,
        #[serde(default)]
        key_type: KeyType,
    },

    /// Propose a self-call removing a purpose from a key
    RemoveKey {
        caller: String,
        key: String,
        purpose: Purpose,
    },

    Approve {
        caller: String,
        execution: u64,
    },

    SetRequiredApprovals {
        caller: String,
        required: u32,
    },
}

impl Step {
    pub fn caller(&self) -> KeyId {
        let label = match self {
            Step::Execute { caller, .. }
            | Step::AddKey { caller, .. }
            | Step::RemoveKey { caller, .. }
            | Step::Approve { caller, .. }
            | Step::SetRequiredApprovals { caller, .. } => caller,
        };
        resolve_key(label)
    }

    /// Short human description for the run log
    pub fn describe(&self) -> String {
        match self {
            Step::Execute {
                caller,
                target,
                value,
                ..
            } => format!("{} executes {} -> {}", caller, value, target),
            Step::AddKey {
                caller,
                key,
                purpose,
                ..
            } => format!("{} proposes add {} as {}", caller, key, purpose),
            Step::RemoveKey {
                caller,
                key,
                purpose,
            } => format!("{} proposes remove {} from {}", caller, purpose, key),
            Step::Approve { caller, execution } => {
                format!("{} approves #{}", caller, ExecutionId::new(*execution))
            }
            Step::SetRequiredApprovals { caller, required } => {
                format!("{} sets required approvals to {}", caller, required)
            }
        }
    }
}

impl Scenario {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read scenario {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub fn management_key_id(&self) -> KeyId {
        resolve_key(&self.management_key)
    }
}

/// Turn a scenario label into a key id
pub fn resolve_key(label: &str) -> KeyId {
    label
        .parse()
        .unwrap_or_else(|_| KeyId::from_credential(label.as_bytes()))
}
