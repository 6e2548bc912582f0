//! Key registry

use crate::error::RegistryError;
use crate::key::Key;
use keygate_core::{KeyId, KeyType, Purpose};
use std::collections::BTreeMap;

/// Result of removing a purpose from a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The purpose was removed, the key still holds other purposes
    PurposeRemoved,
    /// The purpose was the key's last one, so the key itself was removed
    KeyRemoved,
}

/// The identity's key set
///
/// # Invariant
/// At least one key holds `Purpose::Management` at all times.
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    keys: BTreeMap<KeyId, Key>,
}

impl KeyRegistry {
    /// Create a registry seeded with its first management key
    pub fn new(management_key: KeyId, key_type: KeyType) -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(
            management_key,
            Key::new(management_key, Purpose::Management, key_type),
        );
        Self { keys }
    }

    /// True iff the key is present and holds the purpose
    pub fn has_purpose(&self, key_id: &KeyId, purpose: Purpose) -> bool {
        self.keys
            .get(key_id)
            .is_some_and(|key| key.has_purpose(purpose))
    }

    pub fn get_key(&self, key_id: &KeyId) -> Result<&Key, RegistryError> {
        self.keys
            .get(key_id)
            .ok_or(RegistryError::KeyNotFound(*key_id))
    }

    /// Grant a purpose, creating the key if needed.
    ///
    /// Returns `true` if the purpose was newly granted. Granting a purpose the
    /// key already holds is a no-op. The key type of an existing key is kept.
    pub fn add_key(&mut self, key_id: KeyId, purpose: Purpose, key_type: KeyType) -> bool {
        match self.keys.get_mut(&key_id) {
            Some(key) => key.purposes.insert(purpose),
            None => {
                self.keys.insert(key_id, Key::new(key_id, purpose, key_type));
                true
            }
        }
    }

    /// Revoke a purpose, dropping the key once it holds none.
    pub fn remove_key(
        &mut self,
        key_id: &KeyId,
        purpose: Purpose,
    ) -> Result<RemovalOutcome, RegistryError> {
        let management_count = self.management_count();
        let key = self
            .keys
            .get_mut(key_id)
            .ok_or(RegistryError::KeyNotFound(*key_id))?;

        if !key.has_purpose(purpose) {
            return Err(RegistryError::PurposeNotHeld {
                key: *key_id,
                purpose,
            });
        }

        if purpose == Purpose::Management && management_count == 1 {
            return Err(RegistryError::LastManagementKey(*key_id));
        }

        key.purposes.remove(&purpose);

        if key.purposes.is_empty() {
            self.keys.remove(key_id);
            Ok(RemovalOutcome::KeyRemoved)
        } else {
            Ok(RemovalOutcome::PurposeRemoved)
        }
    }

    /// Keys holding a purpose, in identifier order
    pub fn keys_by_purpose(&self, purpose: Purpose) -> Vec<KeyId> {
        self.keys
            .values()
            .filter(|key| key.has_purpose(purpose))
            .map(|key| key.id)
            .collect()
    }

    pub fn management_count(&self) -> usize {
        self.keys.values().filter(|key| key.is_management()).count()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
