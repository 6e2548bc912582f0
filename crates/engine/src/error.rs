//! Engine errors

use crate::policy::PurposeRequirement;
use keygate_core::{ExecutionId, KeyId};
use keygate_registry::RegistryError;
use std::fmt;
use thiserror::Error;

/// Something an operation referred to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Key(KeyId),
    Execution(ExecutionId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Key(id) => write!(f, "key {}", id),
            Resource::Execution(id) => write!(f, "execution {}", id),
        }
    }
}

/// Errors returned by the authorization engine
///
/// Every error aborts its operation before any state is mutated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unauthorized: key {key} requires {required} purpose")]
    Unauthorized {
        key: KeyId,
        required: PurposeRequirement,
    },

    #[error("Not found: {0}")]
    NotFound(Resource),

    #[error("Key {key} already approved execution {execution_id}")]
    AlreadyApproved {
        execution_id: ExecutionId,
        key: KeyId,
    },

    #[error("Execution {0} already executed")]
    AlreadyExecuted(ExecutionId),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, EngineError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }
}

impl From<RegistryError> for EngineError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::KeyNotFound(key) | RegistryError::PurposeNotHeld { key, .. } => {
                EngineError::NotFound(Resource::Key(key))
            }
            RegistryError::LastManagementKey(_) => EngineError::InvariantViolation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::Purpose;

    #[test]
    fn test_registry_error_mapping() {
        let key = KeyId::from_credential(b"root");

        let err = EngineError::from(RegistryError::LastManagementKey(key));
        assert!(matches!(err, EngineError::InvariantViolation(ref msg) if msg.contains("last management key")));

        let err = EngineError::from(RegistryError::PurposeNotHeld {
            key,
            purpose: Purpose::Action,
        });
        assert_eq!(err, EngineError::NotFound(Resource::Key(key)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unauthorized_message() {
        let key = KeyId::from_credential(b"alice");
        let err = EngineError::Unauthorized {
            key,
            required: PurposeRequirement::Management,
        };
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("management"));
    }
}
