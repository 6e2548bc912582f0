//! Keys - identifiers, purposes and algorithm tags
//!
//! A `KeyId` is the SHA-256 digest of an authenticated credential
//! (usually an Ed25519 public key). The engine never sees the credential
//! itself, only the identifier supplied by the caller identity source.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Width of a key identifier in bytes
pub const KEY_ID_LEN: usize = 32;

/// Errors that can occur when parsing key identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyIdError {
    #[error("Invalid key id hex: {0}")]
    InvalidHex(String),

    #[error("Key id must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Fixed-width identifier of a key.
///
/// Serialized as a lowercase hex string.
///
/// # Example
/// ```
/// use keygate_core::KeyId;
///
/// let id = KeyId::from_credential(b"alice");
/// let parsed: KeyId = id.to_hex().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyId([u8; KEY_ID_LEN]);

impl KeyId {
    pub const fn from_bytes(bytes: [u8; KEY_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive an identifier from raw credential bytes
    pub fn from_credential(credential: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(credential);
        Self(hasher.finalize().into())
    }

    /// Derive an identifier from an Ed25519 public key
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        Self::from_credential(key.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; KEY_ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex chars, for log fields
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.short())
    }
}

impl FromStr for KeyId {
    type Err = KeyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| KeyIdError::InvalidHex(e.to_string()))?;
        let len = bytes.len();
        let array: [u8; KEY_ID_LEN] = bytes
            .try_into()
            .map_err(|_| KeyIdError::InvalidLength(len))?;
        Ok(Self(array))
    }
}

impl TryFrom<String> for KeyId {
    type Error = KeyIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<KeyId> for String {
    fn from(id: KeyId) -> Self {
        id.to_hex()
    }
}

/// Privilege tag attached to a key.
///
/// New variants may be added; membership checks are always by variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString,
    Display,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Manages the identity's own key set and configuration
    Management,
    /// Proposes and approves ordinary outgoing actions
    Action,
    /// Signs claims issued by the identity
    Claim,
    /// Encrypts data addressed to the identity
    Encryption,
}

/// Algorithm family of a key. Opaque to the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, Default,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    Ecdsa,
    Rsa,
    #[default]
    Ed25519,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    #[test]
    fn test_key_id_deterministic() {
        assert_eq!(KeyId::from_credential(b"alice"), KeyId::from_credential(b"alice"));
        assert_ne!(KeyId::from_credential(b"alice"), KeyId::from_credential(b"bob"));
    }

    #[test]
    fn test_key_id_hex_roundtrip() {
        let id = KeyId::from_credential(b"alice");
        assert_eq!(id.to_hex().len(), 64);
        assert_eq!(format!("0x{}", id.to_hex()).parse::<KeyId>().unwrap(), id);
    }

    #[test]
    fn test_key_id_rejects_wrong_length() {
        assert_eq!("abcd".parse::<KeyId>(), Err(KeyIdError::InvalidLength(2)));
        assert!(matches!("zz".parse::<KeyId>(), Err(KeyIdError::InvalidHex(_))));
    }

    #[test]
    fn test_key_id_from_public_key() {
        let signing = SigningKey::generate(&mut rand::thread_rng());
        let verifying = signing.verifying_key();
        assert_eq!(
            KeyId::from_public_key(&verifying),
            KeyId::from_credential(verifying.as_bytes())
        );
    }

    #[test]
    fn test_key_id_serde_as_hex() {
        let id = KeyId::from_credential(b"alice");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
    }

    #[test]
    fn test_purpose_parse() {
        assert_eq!("management".parse::<Purpose>().unwrap(), Purpose::Management);
        assert_eq!("ACTION".parse::<Purpose>().unwrap(), Purpose::Action);
        assert!("owner".parse::<Purpose>().is_err());
        assert_eq!(Purpose::Encryption.to_string(), "encryption");
    }

    #[test]
    fn test_key_type_default() {
        assert_eq!(KeyType::default(), KeyType::Ed25519);
        assert_eq!("ecdsa".parse::<KeyType>().unwrap(), KeyType::Ecdsa);
    }
}
