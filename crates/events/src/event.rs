//! Engine events

use chrono::{DateTime, Utc};
use keygate_core::{Address, Amount, ExecutionId, KeyId, KeyType, Purpose};
use serde::{Deserialize, Serialize};

/// How a dispatch ended.
///
/// A failed dispatch still consumes the execution; it is never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Succeeded,
    Failed { reason: String },
    /// The caller stopped waiting before the action sink answered. The sink
    /// call still runs to completion; its result is only logged.
    Abandoned,
}

impl DispatchOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        DispatchOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Succeeded)
    }
}

/// Observable state transitions of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    ExecutionRequested {
        execution_id: ExecutionId,
        proposer: KeyId,
        target: Address,
        value: Amount,
        #[serde(with = "hex_payload")]
        payload: Vec<u8>,
    },
    Approved {
        execution_id: ExecutionId,
        key: KeyId,
    },
    /// Emitted exactly once per execution, when it becomes terminal
    Executed {
        execution_id: ExecutionId,
        target: Address,
        value: Amount,
        #[serde(with = "hex_payload")]
        payload: Vec<u8>,
        outcome: DispatchOutcome,
    },
    KeyAdded {
        key_id: KeyId,
        purpose: Purpose,
        key_type: KeyType,
    },
    KeyRemoved {
        key_id: KeyId,
        purpose: Purpose,
        /// The key held no other purpose and left the registry
        key_removed: bool,
    },
    RequiredApprovalsChanged {
        previous: u32,
        required: u32,
    },
}

impl EngineEvent {
    /// Execution this event refers to, if any
    pub fn execution_id(&self) -> Option<ExecutionId> {
        match self {
            EngineEvent::ExecutionRequested { execution_id, .. }
            | EngineEvent::Approved { execution_id, .. }
            | EngineEvent::Executed { execution_id, .. } => Some(*execution_id),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::ExecutionRequested { .. } => "execution_requested",
            EngineEvent::Approved { .. } => "approved",
            EngineEvent::Executed { .. } => "executed",
            EngineEvent::KeyAdded { .. } => "key_added",
            EngineEvent::KeyRemoved { .. } => "key_removed",
            EngineEvent::RequiredApprovalsChanged { .. } => "required_approvals_changed",
        }
    }
}

/// An event stamped with its position in the engine's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Starts at 1, strictly increasing
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: EngineEvent,
}

impl EventRecord {
    pub fn new(sequence: u64, event: EngineEvent) -> Self {
        Self {
            sequence,
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Opaque payloads are stored hex-encoded
mod hex_payload {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn executed(id: u64) -> EngineEvent {
        EngineEvent::Executed {
            execution_id: ExecutionId::new(id),
            target: Address::from("wallet"),
            value: Amount::new(dec!(0.1)).unwrap(),
            payload: vec![0xde, 0xad],
            outcome: DispatchOutcome::Succeeded,
        }
    }

    #[test]
    fn test_executed_json_shape() {
        let json = serde_json::to_value(executed(0)).unwrap();
        assert_eq!(json["type"], "executed");
        assert_eq!(json["payload"], "dead");
        assert_eq!(json["value"], "0.1");
        assert_eq!(json["outcome"]["status"], "succeeded");
    }

    #[test]
    fn test_failed_outcome_keeps_reason() {
        let outcome = DispatchOutcome::failed("sink offline");
        assert!(!outcome.is_success());
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("sink offline"));
    }

    #[test]
    fn test_abandoned_outcome_json() {
        let json = serde_json::to_value(DispatchOutcome::Abandoned).unwrap();
        assert_eq!(json["status"], "abandoned");
        assert!(!DispatchOutcome::Abandoned.is_success());
    }

    #[test]
    fn test_execution_id_accessor() {
        assert_eq!(executed(4).execution_id(), Some(ExecutionId::new(4)));
        let changed = EngineEvent::RequiredApprovalsChanged {
            previous: 1,
            required: 2,
        };
        assert_eq!(changed.execution_id(), None);
        assert_eq!(changed.name(), "required_approvals_changed");
    }
}
