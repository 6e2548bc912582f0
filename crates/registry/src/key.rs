//! Registered key record

use keygate_core::{KeyId, KeyType, Purpose};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A key held by the identity
///
/// # Invariant
/// `purposes` is never empty while the key is registered. A key whose last
/// purpose is removed is dropped from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub id: KeyId,
    pub purposes: BTreeSet<Purpose>,
    pub key_type: KeyType,
}

impl Key {
    pub fn new(id: KeyId, purpose: Purpose, key_type: KeyType) -> Self {
        Self {
            id,
            purposes: BTreeSet::from([purpose]),
            key_type,
        }
    }

    pub fn has_purpose(&self, purpose: Purpose) -> bool {
        self.purposes.contains(&purpose)
    }

    pub fn is_management(&self) -> bool {
        self.has_purpose(Purpose::Management)
    }
}
