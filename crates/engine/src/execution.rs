//! Queued execution record

use chrono::{DateTime, Utc};
use keygate_core::{Address, Amount, ExecutionId, KeyId, Purpose};
use keygate_events::DispatchOutcome;
use keygate_registry::KeyRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Purpose context the proposer held when the execution was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposerRole {
    Management,
    Action,
}

impl ProposerRole {
    /// Management wins when a key holds both purposes
    pub fn of(registry: &KeyRegistry, key: &KeyId) -> Self {
        if registry.has_purpose(key, Purpose::Management) {
            ProposerRole::Management
        } else {
            ProposerRole::Action
        }
    }
}

/// A proposed action and the approvals it has collected
///
/// Once `executed` is set the record never changes again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub proposer: KeyId,
    pub proposer_role: ProposerRole,
    pub target: Address,
    pub value: Amount,
    pub payload: Vec<u8>,
    /// Target is the identity itself
    pub self_call: bool,
    pub approvers: BTreeSet<KeyId>,
    pub executed: bool,
    /// Set together with `executed`
    pub outcome: Option<DispatchOutcome>,
    pub created_at: DateTime<Utc>,
}

impl Execution {
    pub fn new(
        id: ExecutionId,
        proposer: KeyId,
        proposer_role: ProposerRole,
        target: Address,
        value: Amount,
        payload: Vec<u8>,
        self_call: bool,
    ) -> Self {
        Self {
            id,
            proposer,
            proposer_role,
            target,
            value,
            payload,
            self_call,
            approvers: BTreeSet::new(),
            executed: false,
            outcome: None,
            created_at: Utc::now(),
        }
    }

    pub fn has_approved(&self, key: &KeyId) -> bool {
        self.approvers.contains(key)
    }

    pub fn approvals(&self) -> usize {
        self.approvers.len()
    }

    pub fn is_pending(&self) -> bool {
        !self.executed
    }

    pub fn dispatch_failed(&self) -> bool {
        matches!(self.outcome, Some(DispatchOutcome::Failed { .. }))
    }
}
