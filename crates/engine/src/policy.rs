//! Authorization and quorum rules
//!
//! Both rules are evaluated fresh on every call: purposes are read from the
//! registry at the moment a key proposes or approves, and the threshold is
//! read at every quorum evaluation.

use keygate_core::{KeyId, Purpose};
use keygate_registry::KeyRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Purpose a caller must hold for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurposeRequirement {
    /// Ordinary outgoing calls and transfers
    ActionOrManagement,
    /// Self-calls and configuration changes
    Management,
}

impl PurposeRequirement {
    /// Requirement to propose or approve an execution
    pub fn for_target(target_is_self: bool) -> Self {
        if target_is_self {
            PurposeRequirement::Management
        } else {
            PurposeRequirement::ActionOrManagement
        }
    }

    pub fn is_satisfied_by(&self, registry: &KeyRegistry, key: &KeyId) -> bool {
        match self {
            PurposeRequirement::Management => registry.has_purpose(key, Purpose::Management),
            PurposeRequirement::ActionOrManagement => {
                registry.has_purpose(key, Purpose::Action)
                    || registry.has_purpose(key, Purpose::Management)
            }
        }
    }
}

impl fmt::Display for PurposeRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurposeRequirement::ActionOrManagement => f.write_str("action or management"),
            PurposeRequirement::Management => f.write_str("management"),
        }
    }
}

/// Live approval threshold
///
/// Quorum is checked against the current value only. An execution queued
/// under one threshold is judged by whatever threshold is in force when its
/// next approval arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumPolicy {
    required_approvals: u32,
}

impl QuorumPolicy {
    pub fn new(required_approvals: u32) -> Self {
        Self { required_approvals }
    }

    pub fn required(&self) -> u32 {
        self.required_approvals
    }

    /// Replace the threshold, returning the previous value
    pub fn set_required(&mut self, required: u32) -> u32 {
        std::mem::replace(&mut self.required_approvals, required)
    }

    pub fn is_met(&self, approvals: usize) -> bool {
        approvals >= self.required_approvals as usize
    }

    /// Whether the proposer's own approval can complete quorum, so that
    /// `execute` approves and dispatches in the same call
    pub fn proposer_suffices(&self) -> bool {
        self.required_approvals <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_core::KeyType;

    fn key(name: &str) -> KeyId {
        KeyId::from_credential(name.as_bytes())
    }

    fn registry() -> KeyRegistry {
        let mut registry = KeyRegistry::new(key("root"), KeyType::Ed25519);
        registry.add_key(key("actor"), Purpose::Action, KeyType::Ed25519);
        registry.add_key(key("claims"), Purpose::Claim, KeyType::Ed25519);
        registry
    }

    #[test]
    fn test_ordinary_target_accepts_action_and_management() {
        let registry = registry();
        let requirement = PurposeRequirement::for_target(false);

        assert!(requirement.is_satisfied_by(&registry, &key("root")));
        assert!(requirement.is_satisfied_by(&registry, &key("actor")));
        assert!(!requirement.is_satisfied_by(&registry, &key("claims")));
        assert!(!requirement.is_satisfied_by(&registry, &key("ghost")));
    }

    #[test]
    fn test_self_call_requires_management() {
        let registry = registry();
        let requirement = PurposeRequirement::for_target(true);

        assert!(requirement.is_satisfied_by(&registry, &key("root")));
        assert!(!requirement.is_satisfied_by(&registry, &key("actor")));
    }

    #[test]
    fn test_quorum_thresholds() {
        let zero = QuorumPolicy::new(0);
        assert!(zero.is_met(0));
        assert!(zero.proposer_suffices());

        let two = QuorumPolicy::new(2);
        assert!(!two.is_met(1));
        assert!(two.is_met(2));
        assert!(two.is_met(3));
        assert!(!two.proposer_suffices());
    }

    #[test]
    fn test_set_required_returns_previous() {
        let mut policy = QuorumPolicy::new(1);
        assert_eq!(policy.set_required(3), 1);
        assert_eq!(policy.required(), 3);
    }
}
