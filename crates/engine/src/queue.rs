//! Execution queue - the append-only ledger of proposed actions
//!
//! Entries are indexed by their sequential id and never removed. An entry
//! that never reaches quorum stays pending forever.

use crate::error::{EngineError, EngineResult, Resource};
use crate::execution::{Execution, ProposerRole};
use keygate_core::{Address, Amount, ExecutionId, KeyId};
use keygate_events::DispatchOutcome;

/// Counts over the whole ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub executed: usize,
    /// Executed entries whose dispatch failed
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct ExecutionQueue {
    entries: Vec<Execution>,
}

impl ExecutionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next proposal will receive
    pub fn next_id(&self) -> ExecutionId {
        ExecutionId::new(self.entries.len() as u64)
    }

    /// Record a new execution with no approvals
    pub fn propose(
        &mut self,
        proposer: KeyId,
        proposer_role: ProposerRole,
        target: Address,
        value: Amount,
        payload: Vec<u8>,
        self_call: bool,
    ) -> ExecutionId {
        let id = self.next_id();
        self.entries.push(Execution::new(
            id,
            proposer,
            proposer_role,
            target,
            value,
            payload,
            self_call,
        ));
        id
    }

    pub fn get(&self, id: ExecutionId) -> EngineResult<&Execution> {
        usize::try_from(id.value())
            .ok()
            .and_then(|index| self.entries.get(index))
            .ok_or(EngineError::NotFound(Resource::Execution(id)))
    }

    fn get_mut(&mut self, id: ExecutionId) -> EngineResult<&mut Execution> {
        usize::try_from(id.value())
            .ok()
            .and_then(|index| self.entries.get_mut(index))
            .ok_or(EngineError::NotFound(Resource::Execution(id)))
    }

    /// Fetch an entry that can still accept approvals
    pub fn get_open(&self, id: ExecutionId) -> EngineResult<&Execution> {
        let execution = self.get(id)?;
        if execution.executed {
            return Err(EngineError::AlreadyExecuted(id));
        }
        Ok(execution)
    }

    /// Add an approver, returning the new approval count
    pub fn record_approval(&mut self, id: ExecutionId, key: KeyId) -> EngineResult<usize> {
        let execution = self.get_mut(id)?;
        if execution.executed {
            return Err(EngineError::AlreadyExecuted(id));
        }
        if !execution.approvers.insert(key) {
            return Err(EngineError::AlreadyApproved {
                execution_id: id,
                key,
            });
        }
        Ok(execution.approvers.len())
    }

    /// Flip an entry to executed and return a snapshot for dispatch.
    ///
    /// This is the only place `executed` becomes true; a second call for the
    /// same id fails, so an entry is handed to the dispatcher at most once.
    pub fn mark_executed(&mut self, id: ExecutionId) -> EngineResult<Execution> {
        let execution = self.get_mut(id)?;
        if execution.executed {
            return Err(EngineError::AlreadyExecuted(id));
        }
        execution.executed = true;
        Ok(execution.clone())
    }

    /// Attach the dispatch result to an executed entry
    pub fn record_outcome(&mut self, id: ExecutionId, outcome: DispatchOutcome) -> EngineResult<()> {
        let execution = self.get_mut(id)?;
        if !execution.executed || execution.outcome.is_some() {
            return Err(EngineError::InvariantViolation(format!(
                "outcome recorded out of order for execution {}",
                id
            )));
        }
        execution.outcome = Some(outcome);
        Ok(())
    }

    pub fn pending(&self) -> impl Iterator<Item = &Execution> {
        self.entries.iter().filter(|e| e.is_pending())
    }

    pub fn stats(&self) -> QueueStats {
        self.entries.iter().fold(
            QueueStats {
                total: self.entries.len(),
                ..QueueStats::default()
            },
            |mut stats, execution| {
                if execution.executed {
                    stats.executed += 1;
                    if execution.dispatch_failed() {
                        stats.failed += 1;
                    }
                } else {
                    stats.pending += 1;
                }
                stats
            },
        )
    }
}
