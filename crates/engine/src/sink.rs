//! Action sinks - the external effect of a non-self-call execution
//!
//! The engine hands value and payload to the sink once and records whatever
//! it answers. Delivery guarantees beyond that belong to the sink.

use async_trait::async_trait;
use keygate_core::{Address, Amount};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors reported by an action sink
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Action rejected: {0}")]
    Rejected(String),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// External collaborator performing transfers and calls
#[async_trait]
pub trait ActionSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &str;

    /// Perform the action. Called at most once per execution.
    async fn send(&self, target: &Address, value: Amount, payload: &[u8]) -> Result<(), SinkError>;
}

/// A delivered action, as recorded by `InMemoryLedger`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub target: Address,
    pub value: Amount,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct LedgerState {
    reserve: Decimal,
    balances: BTreeMap<Address, Amount>,
    deliveries: Vec<Delivery>,
}

/// In-process balance ledger
///
/// Transfers move value from the identity's reserve to the target's
/// balance. A transfer larger than the reserve is rejected.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Create a ledger funded with the identity's reserve
    pub fn new(reserve: Amount) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                reserve: reserve.value(),
                ..LedgerState::default()
            }),
        }
    }

    pub async fn balance(&self, address: &Address) -> Amount {
        self.state
            .read()
            .await
            .balances
            .get(address)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub async fn reserve(&self) -> Amount {
        // Never negative: `send` refuses to overdraw
        Amount::new(self.state.read().await.reserve).unwrap_or(Amount::ZERO)
    }

    pub async fn balances(&self) -> BTreeMap<Address, Amount> {
        self.state.read().await.balances.clone()
    }

    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.state.read().await.deliveries.clone()
    }
}

#[async_trait]
impl ActionSink for InMemoryLedger {
    fn name(&self) -> &str {
        "in_memory_ledger"
    }

    async fn send(&self, target: &Address, value: Amount, payload: &[u8]) -> Result<(), SinkError> {
        let mut state = self.state.write().await;

        let remaining = state.reserve - value.value();
        if remaining < Decimal::ZERO {
            return Err(SinkError::InsufficientFunds {
                requested: value,
                available: Amount::new(state.reserve).unwrap_or(Amount::ZERO),
            });
        }

        let current = state.balances.get(target).copied().unwrap_or(Amount::ZERO);
        let updated = current
            .checked_add(&value)
            .ok_or_else(|| SinkError::Rejected(format!("balance overflow for {}", target)))?;

        state.reserve = remaining;
        state.balances.insert(target.clone(), updated);
        state.deliveries.push(Delivery {
            target: target.clone(),
            value,
            payload: payload.to_vec(),
        });

        Ok(())
    }
}

/// Sink that refuses every action, counting attempts
#[derive(Debug)]
pub struct RejectingSink {
    reason: String,
    attempts: AtomicUsize,
}

impl RejectingSink {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionSink for RejectingSink {
    fn name(&self) -> &str {
        "rejecting"
    }

    async fn send(&self, _target: &Address, _value: Amount, _payload: &[u8]) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Rejected(self.reason.clone()))
    }
}
