//! Addresses and execution identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target of an execution.
///
/// Addresses are opaque to the engine apart from one comparison: an
/// execution whose target equals the identity's own address is a self-call.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Sequential execution identifier, assigned from 0 and never reused
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ExecutionId(u64);

impl ExecutionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ExecutionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_equality() {
        assert_eq!(Address::from("wallet"), Address::new(String::from("wallet")));
        assert_ne!(Address::from("wallet"), Address::from("Wallet"));
    }

    #[test]
    fn test_execution_id_starts_at_zero() {
        let first = ExecutionId::default();
        assert_eq!(first.value(), 0);
        assert_eq!(ExecutionId::from(2), ExecutionId::new(2));
    }

    #[test]
    fn test_transparent_serde() {
        assert_eq!(serde_json::to_string(&Address::from("w")).unwrap(), "\"w\"");
        assert_eq!(serde_json::to_string(&ExecutionId::new(7)).unwrap(), "7");
    }
}
