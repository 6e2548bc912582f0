//! Audit checks over a replayed event history

use crate::error::EventError;
use crate::event::{EngineEvent, EventRecord};
use std::collections::BTreeSet;

/// Counts gathered while auditing a history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub records: usize,
    pub requested: usize,
    pub executed: usize,
    /// Dispatches that did not succeed, abandoned ones included
    pub failed: usize,
}

impl AuditSummary {
    /// Requested executions that never reached quorum
    pub fn pending(&self) -> usize {
        self.requested.saturating_sub(self.executed)
    }
}

/// Verify that sequences increase and no execution was dispatched twice
pub fn verify_single_dispatch(records: &[EventRecord]) -> Result<AuditSummary, EventError> {
    let mut summary = AuditSummary::default();
    let mut dispatched = BTreeSet::new();
    let mut last_sequence = 0;

    for record in records {
        if record.sequence <= last_sequence {
            return Err(EventError::InvalidSequence {
                expected: last_sequence + 1,
                actual: record.sequence,
            });
        }
        last_sequence = record.sequence;
        summary.records += 1;

        match &record.event {
            EngineEvent::ExecutionRequested { .. } => summary.requested += 1,
            EngineEvent::Executed {
                execution_id,
                outcome,
                ..
            } => {
                if !dispatched.insert(*execution_id) {
                    return Err(EventError::DuplicateDispatch(*execution_id));
                }
                summary.executed += 1;
                if !outcome.is_success() {
                    summary.failed += 1;
                }
            }
            _ => {}
        }
    }

    Ok(summary)
}
