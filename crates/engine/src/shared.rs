//! Shared engine handle for concurrent callers
//!
//! Every operation holds the lock for its full duration, including the
//! awaited action sink call during dispatch. Concurrent approvals of the same
//! execution are therefore serialized and only one of them can dispatch it.
//! Dropping an operation mid-dispatch still concludes the execution, with a
//! `DispatchOutcome::Abandoned` outcome.

use std::collections::BTreeSet;
use std::sync::Arc;

use keygate_core::{Address, Amount, ExecutionId, KeyId, Purpose};
use keygate_events::EventRecord;
use tokio::sync::Mutex;

use crate::engine::{ApprovalStatus, AuthorizationEngine};
use crate::error::EngineResult;
use crate::queue::QueueStats;

#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<AuthorizationEngine>>,
}

impl SharedEngine {
    pub fn new(engine: AuthorizationEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub async fn execute(
        &self,
        caller: &KeyId,
        target: Address,
        value: Amount,
        payload: Vec<u8>,
    ) -> EngineResult<ExecutionId> {
        self.inner
            .lock()
            .await
            .execute(caller, target, value, payload)
            .await
    }

    pub async fn approve(&self, caller: &KeyId, id: ExecutionId) -> EngineResult<ApprovalStatus> {
        self.inner.lock().await.approve(caller, id).await
    }

    pub async fn set_required_approvals(&self, caller: &KeyId, required: u32) -> EngineResult<()> {
        self.inner.lock().await.set_required_approvals(caller, required)
    }

    pub async fn key_has_purpose(&self, key: &KeyId, purpose: Purpose) -> bool {
        self.inner.lock().await.key_has_purpose(key, purpose)
    }

    pub async fn get_execution_approvals(&self, id: ExecutionId) -> EngineResult<BTreeSet<KeyId>> {
        self.inner.lock().await.get_execution_approvals(id)
    }

    pub async fn stats(&self) -> QueueStats {
        self.inner.lock().await.stats()
    }

    pub async fn drain_events(&self) -> Vec<EventRecord> {
        self.inner.lock().await.drain_events()
    }
}
