//! Registry errors

use keygate_core::{KeyId, Purpose};
use thiserror::Error;

/// Errors that can occur in registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Key not found: {0}")]
    KeyNotFound(KeyId),

    #[error("Key {key} does not hold purpose {purpose}")]
    PurposeNotHeld { key: KeyId, purpose: Purpose },

    #[error("Cannot remove {0}: it is the last management key")]
    LastManagementKey(KeyId),
}

impl RegistryError {
    /// Whether the error refers to a key or purpose that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::KeyNotFound(_) | RegistryError::PurposeNotHeld { .. }
        )
    }
}
