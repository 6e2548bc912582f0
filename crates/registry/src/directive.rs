//! Self-call directives
//!
//! The payload of an execution targeting the identity itself is a JSON
//! document describing one mutation of the identity's own state:
//!
//! ```json
//! {"op":"add_key","key_id":"<64 hex chars>","purpose":"action","key_type":"ed25519"}
//! {"op":"remove_key","key_id":"<64 hex chars>","purpose":"action"}
//! {"op":"set_required_approvals","required":2}
//! ```

use keygate_core::{KeyId, KeyType, Purpose};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when decoding a directive
#[derive(Error, Debug)]
pub enum DirectiveError {
    #[error("Malformed self-call payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A mutation of the identity's own key set or configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum KeyDirective {
    AddKey {
        key_id: KeyId,
        purpose: Purpose,
        #[serde(default)]
        key_type: KeyType,
    },
    RemoveKey {
        key_id: KeyId,
        purpose: Purpose,
    },
    SetRequiredApprovals {
        required: u32,
    },
}

impl KeyDirective {
    pub fn add_key(key_id: KeyId, purpose: Purpose, key_type: KeyType) -> Self {
        KeyDirective::AddKey {
            key_id,
            purpose,
            key_type,
        }
    }

    pub fn remove_key(key_id: KeyId, purpose: Purpose) -> Self {
        KeyDirective::RemoveKey { key_id, purpose }
    }

    /// Serialize to payload bytes
    ///
    /// Every field is an id, enum or integer with a plain serde impl, so JSON
    /// serialization has no failure path.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("KeyDirective serialization should never fail")
    }

    /// Parse payload bytes
    pub fn decode(payload: &[u8]) -> Result<Self, DirectiveError> {
        Ok(serde_json::from_slice(payload)?)
    }
}
