//! Authorization engine - the public surface
//!
//! Owns the key registry, the execution queue, the live threshold and the
//! dispatcher. Every operation takes `&mut self`, so state transitions are
//! linearized; use `SharedEngine` to share one engine between tasks.

use std::collections::BTreeSet;
use std::sync::Arc;

use keygate_core::{Address, Amount, ExecutionId, KeyId, KeyType, Purpose};
use keygate_events::{DispatchOutcome, EngineEvent, EventRecord};
use keygate_registry::{Key, KeyRegistry};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{EngineError, EngineResult};
use crate::execution::{Execution, ProposerRole};
use crate::policy::{PurposeRequirement, QuorumPolicy};
use crate::queue::{ExecutionQueue, QueueStats};
use crate::sink::ActionSink;

/// Where an execution stands after an approval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalStatus {
    /// Quorum not reached yet
    Pending { approvals: usize, required: u32 },
    /// Quorum reached; the execution was dispatched in this call
    Dispatched(DispatchOutcome),
}

impl ApprovalStatus {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, ApprovalStatus::Dispatched(_))
    }
}

pub struct AuthorizationEngine {
    address: Address,
    registry: KeyRegistry,
    queue: ExecutionQueue,
    quorum: QuorumPolicy,
    dispatcher: Dispatcher,
    events: Vec<EventRecord>,
    last_sequence: u64,
}

impl AuthorizationEngine {
    /// Create an engine whose registry holds a single management key
    pub fn new(
        config: &EngineConfig,
        management_key: KeyId,
        key_type: KeyType,
        sink: Arc<dyn ActionSink>,
    ) -> Self {
        info!(
            address = %config.identity_address,
            management_key = %management_key.short(),
            required_approvals = config.required_approvals,
            "Authorization engine initialized"
        );

        Self {
            address: config.address(),
            registry: KeyRegistry::new(management_key, key_type),
            queue: ExecutionQueue::new(),
            quorum: QuorumPolicy::new(config.required_approvals),
            dispatcher: Dispatcher::new(sink),
            events: Vec::new(),
            last_sequence: 0,
        }
    }

    // === Operations ===

    /// Propose an execution.
    ///
    /// When the current threshold is 0 or 1 the proposer's approval completes
    /// quorum and the execution is dispatched before this call returns.
    pub async fn execute(
        &mut self,
        caller: &KeyId,
        target: Address,
        value: Amount,
        payload: Vec<u8>,
    ) -> EngineResult<ExecutionId> {
        let self_call = target == self.address;
        self.check_purpose(caller, PurposeRequirement::for_target(self_call))?;

        let role = ProposerRole::of(&self.registry, caller);
        let id = self.queue.propose(
            *caller,
            role,
            target.clone(),
            value,
            payload.clone(),
            self_call,
        );

        debug!(
            execution_id = %id,
            proposer = %caller.short(),
            target = %target,
            value = %value,
            self_call,
            "Execution requested"
        );
        self.emit(EngineEvent::ExecutionRequested {
            execution_id: id,
            proposer: *caller,
            target,
            value,
            payload,
        });

        if self.quorum.proposer_suffices() {
            self.approve(caller, id).await?;
        }

        Ok(id)
    }

    /// Approve a pending execution, dispatching it if quorum is now met.
    pub async fn approve(&mut self, caller: &KeyId, id: ExecutionId) -> EngineResult<ApprovalStatus> {
        let execution = self.queue.get_open(id)?;
        if execution.has_approved(caller) {
            return Err(EngineError::AlreadyApproved {
                execution_id: id,
                key: *caller,
            });
        }
        let requirement = PurposeRequirement::for_target(execution.self_call);
        self.check_purpose(caller, requirement)?;

        let approvals = self.queue.record_approval(id, *caller)?;
        debug!(execution_id = %id, key = %caller.short(), approvals, "Execution approved");
        self.emit(EngineEvent::Approved {
            execution_id: id,
            key: *caller,
        });

        if !self.quorum.is_met(approvals) {
            return Ok(ApprovalStatus::Pending {
                approvals,
                required: self.quorum.required(),
            });
        }

        let outcome = self.dispatch(id).await?;
        Ok(ApprovalStatus::Dispatched(outcome))
    }

    /// Change the live threshold. Management keys only.
    ///
    /// Queued executions are not re-evaluated here; the new value applies from
    /// their next approval.
    pub fn set_required_approvals(&mut self, caller: &KeyId, required: u32) -> EngineResult<()> {
        self.check_purpose(caller, PurposeRequirement::Management)?;

        let previous = self.quorum.set_required(required);
        info!(key = %caller.short(), previous, required, "Required approvals changed");
        self.emit(EngineEvent::RequiredApprovalsChanged { previous, required });
        Ok(())
    }

    // === Queries ===

    pub fn key_has_purpose(&self, key: &KeyId, purpose: Purpose) -> bool {
        self.registry.has_purpose(key, purpose)
    }

    pub fn get_key(&self, key: &KeyId) -> EngineResult<&Key> {
        Ok(self.registry.get_key(key)?)
    }

    pub fn keys_by_purpose(&self, purpose: Purpose) -> Vec<KeyId> {
        self.registry.keys_by_purpose(purpose)
    }

    pub fn get_execution_approvals(&self, id: ExecutionId) -> EngineResult<BTreeSet<KeyId>> {
        Ok(self.queue.get(id)?.approvers.clone())
    }

    pub fn get_execution(&self, id: ExecutionId) -> EngineResult<&Execution> {
        self.queue.get(id)
    }

    pub fn pending_executions(&self) -> Vec<&Execution> {
        self.queue.pending().collect()
    }

    pub fn required_approvals(&self) -> u32 {
        self.quorum.required()
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    // === Events ===

    /// Buffered events not yet drained
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Take all buffered events, oldest first
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    // === Internals ===

    fn check_purpose(&self, caller: &KeyId, required: PurposeRequirement) -> EngineResult<()> {
        if required.is_satisfied_by(&self.registry, caller) {
            return Ok(());
        }
        warn!(key = %caller.short(), %required, "Caller lacks required purpose");
        Err(EngineError::Unauthorized {
            key: *caller,
            required,
        })
    }

    /// Consume an execution that reached quorum.
    ///
    /// If this future is dropped while the sink call is pending, the guard
    /// concludes the execution as `Abandoned`.
    async fn dispatch(&mut self, id: ExecutionId) -> EngineResult<DispatchOutcome> {
        let execution = self.queue.mark_executed(id)?;
        let mut guard = DispatchGuard {
            engine: self,
            execution,
            concluded: false,
        };

        let (outcome, directive_events) = {
            let engine = &mut *guard.engine;
            engine
                .dispatcher
                .dispatch(&guard.execution, &mut engine.registry, &mut engine.quorum)
                .await
        };

        guard.concluded = true;
        guard
            .engine
            .conclude(&guard.execution, outcome.clone(), directive_events)?;
        Ok(outcome)
    }

    /// Record the outcome of an executed entry and emit its `Executed` event
    fn conclude(
        &mut self,
        execution: &Execution,
        outcome: DispatchOutcome,
        directive_events: Vec<EngineEvent>,
    ) -> EngineResult<()> {
        self.queue.record_outcome(execution.id, outcome.clone())?;
        for event in directive_events {
            self.emit(event);
        }

        info!(
            execution_id = %execution.id,
            target = %execution.target,
            value = %execution.value,
            approvals = execution.approvals(),
            success = outcome.is_success(),
            "Execution dispatched"
        );
        self.emit(EngineEvent::Executed {
            execution_id: execution.id,
            target: execution.target.clone(),
            value: execution.value,
            payload: execution.payload.clone(),
            outcome,
        });
        Ok(())
    }

    fn emit(&mut self, event: EngineEvent) {
        self.last_sequence += 1;
        self.events.push(EventRecord::new(self.last_sequence, event));
    }
}

/// Concludes an executed entry whose dispatch was cut short
struct DispatchGuard<'a> {
    engine: &'a mut AuthorizationEngine,
    execution: Execution,
    concluded: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if self.concluded {
            return;
        }
        warn!(execution_id = %self.execution.id, "Dispatch abandoned by caller");
        if let Err(e) = self
            .engine
            .conclude(&self.execution, DispatchOutcome::Abandoned, Vec::new())
        {
            warn!(execution_id = %self.execution.id, error = %e, "Cannot conclude abandoned dispatch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{InMemoryLedger, RejectingSink};
    use keygate_registry::KeyDirective;
    use rust_decimal_macros::dec;

    fn key(name: &str) -> KeyId {
        KeyId::from_credential(name.as_bytes())
    }

    fn engine(required: u32) -> AuthorizationEngine {
        engine_with_sink(required, Arc::new(InMemoryLedger::new(Amount::new(dec!(100)).unwrap())))
    }

    fn engine_with_sink(required: u32, sink: Arc<dyn ActionSink>) -> AuthorizationEngine {
        let config = EngineConfig {
            required_approvals: required,
            ..EngineConfig::default()
        };
        AuthorizationEngine::new(&config, key("root"), KeyType::Ed25519, sink)
    }

    /// Grant a purpose through a self-call under threshold 1
    async fn grant(engine: &mut AuthorizationEngine, name: &str, purpose: Purpose) {
        let previous = engine.required_approvals();
        engine.set_required_approvals(&key("root"), 1).unwrap();
        let payload = KeyDirective::add_key(key(name), purpose, KeyType::Ed25519).encode();
        let target = engine.address().clone();
        engine
            .execute(&key("root"), target, Amount::ZERO, payload)
            .await
            .unwrap();
        engine.set_required_approvals(&key("root"), previous).unwrap();
    }

    #[tokio::test]
    async fn test_unknown_key_cannot_execute() {
        let mut engine = engine(1);
        let result = engine
            .execute(&key("ghost"), Address::from("wallet"), Amount::ZERO, vec![])
            .await;

        assert!(matches!(result, Err(EngineError::Unauthorized { .. })));
        assert!(engine.events().is_empty());
        assert_eq!(engine.stats().total, 0);
    }

    #[tokio::test]
    async fn test_threshold_two_waits_for_approvals() {
        let mut engine = engine(2);
        grant(&mut engine, "alice", Purpose::Action).await;

        let id = engine
            .execute(&key("root"), Address::from("wallet"), Amount::ZERO, vec![])
            .await
            .unwrap();
        assert!(engine.get_execution_approvals(id).unwrap().is_empty());

        let status = engine.approve(&key("root"), id).await.unwrap();
        assert_eq!(
            status,
            ApprovalStatus::Pending {
                approvals: 1,
                required: 2
            }
        );

        let status = engine.approve(&key("alice"), id).await.unwrap();
        assert_eq!(status, ApprovalStatus::Dispatched(DispatchOutcome::Succeeded));
        assert!(engine.get_execution(id).unwrap().executed);
    }

    #[tokio::test]
    async fn test_claim_key_cannot_approve() {
        let mut engine = engine(2);
        grant(&mut engine, "notary", Purpose::Claim).await;

        let id = engine
            .execute(&key("root"), Address::from("wallet"), Amount::ZERO, vec![])
            .await
            .unwrap();
        let result = engine.approve(&key("notary"), id).await;
        assert!(result.unwrap_err().is_unauthorized());
        assert!(engine.get_execution_approvals(id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_dispatch_still_consumes_execution() {
        let sink = Arc::new(RejectingSink::new("offline"));
        let mut engine = engine_with_sink(1, sink.clone());

        let id = engine
            .execute(&key("root"), Address::from("wallet"), Amount::ZERO, vec![])
            .await
            .unwrap();

        let execution = engine.get_execution(id).unwrap();
        assert!(execution.executed);
        assert!(execution.dispatch_failed());
        assert_eq!(
            engine.approve(&key("root"), id).await.unwrap_err(),
            EngineError::AlreadyExecuted(id)
        );
        assert_eq!(sink.attempts(), 1);
        assert_eq!(engine.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_events_in_order() {
        let mut engine = engine(1);
        engine
            .execute(&key("root"), Address::from("wallet"), Amount::ZERO, b"x".to_vec())
            .await
            .unwrap();

        let records = engine.drain_events();
        let names: Vec<_> = records.iter().map(|r| r.event.name()).collect();
        assert_eq!(names, vec!["execution_requested", "approved", "executed"]);
        let sequences: Vec<_> = records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert!(engine.events().is_empty());
    }

    #[tokio::test]
    async fn test_set_required_approvals_requires_management() {
        let mut engine = engine(1);
        grant(&mut engine, "alice", Purpose::Action).await;

        let result = engine.set_required_approvals(&key("alice"), 0);
        assert_eq!(
            result.unwrap_err(),
            EngineError::Unauthorized {
                key: key("alice"),
                required: PurposeRequirement::Management
            }
        );
        assert_eq!(engine.required_approvals(), 1);
    }

    #[tokio::test]
    async fn test_proposer_role_recorded() {
        let mut engine = engine(2);
        grant(&mut engine, "alice", Purpose::Action).await;

        let id = engine
            .execute(&key("alice"), Address::from("wallet"), Amount::ZERO, vec![])
            .await
            .unwrap();
        let execution = engine.get_execution(id).unwrap();
        assert_eq!(execution.proposer_role, ProposerRole::Action);
        assert!(!execution.self_call);
        assert_eq!(engine.pending_executions().len(), 1);
    }
}
