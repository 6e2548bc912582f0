//! Dispatcher - performs the side effect of an approved execution
//!
//! Self-calls are decoded as `KeyDirective`s and applied to the identity's
//! own state. Everything else is forwarded verbatim to the action sink.
//! Failures are reported as a `DispatchOutcome`, never retried.
//!
//! The sink call runs on its own task, so it completes even when the caller
//! of `dispatch` stops waiting for it.

use std::sync::Arc;

use keygate_events::{DispatchOutcome, EngineEvent};
use keygate_registry::{KeyDirective, KeyRegistry, RemovalOutcome};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::execution::Execution;
use crate::policy::QuorumPolicy;
use crate::sink::ActionSink;

pub struct Dispatcher {
    sink: Arc<dyn ActionSink>,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn ActionSink>) -> Self {
        Self { sink }
    }

    /// Perform one execution.
    ///
    /// Returns the outcome plus the events produced by a self-call directive.
    /// A failed directive leaves the registry and threshold untouched.
    pub async fn dispatch(
        &self,
        execution: &Execution,
        registry: &mut KeyRegistry,
        quorum: &mut QuorumPolicy,
    ) -> (DispatchOutcome, Vec<EngineEvent>) {
        if execution.self_call {
            return match Self::apply_self_call(&execution.payload, registry, quorum) {
                Ok(events) => (DispatchOutcome::Succeeded, events),
                Err(reason) => {
                    warn!(execution_id = %execution.id, %reason, "Self-call directive failed");
                    (DispatchOutcome::failed(reason), Vec::new())
                }
            };
        }

        let sink = Arc::clone(&self.sink);
        let execution_id = execution.id;
        let target = execution.target.clone();
        let value = execution.value;
        let payload = execution.payload.clone();
        let delivery = tokio::spawn(async move {
            let result = sink.send(&target, value, &payload).await;
            debug!(%execution_id, sink = sink.name(), ok = result.is_ok(), "Sink call finished");
            result
        });

        match delivery.await {
            Ok(Ok(())) => {
                debug!(
                    execution_id = %execution.id,
                    sink = self.sink.name(),
                    target = %execution.target,
                    value = %execution.value,
                    "Action delivered"
                );
                (DispatchOutcome::Succeeded, Vec::new())
            }
            Ok(Err(e)) => {
                warn!(
                    execution_id = %execution.id,
                    sink = self.sink.name(),
                    error = %e,
                    "Action sink rejected execution"
                );
                (DispatchOutcome::failed(e.to_string()), Vec::new())
            }
            Err(e) => {
                warn!(
                    execution_id = %execution.id,
                    sink = self.sink.name(),
                    error = %e,
                    "Action sink task failed"
                );
                (DispatchOutcome::failed(format!("Action sink task failed: {}", e)), Vec::new())
            }
        }
    }

    fn apply_self_call(
        payload: &[u8],
        registry: &mut KeyRegistry,
        quorum: &mut QuorumPolicy,
    ) -> Result<Vec<EngineEvent>, String> {
        let directive = KeyDirective::decode(payload).map_err(|e| e.to_string())?;
        Self::apply_directive(directive, registry, quorum).map_err(|e| e.to_string())
    }

    fn apply_directive(
        directive: KeyDirective,
        registry: &mut KeyRegistry,
        quorum: &mut QuorumPolicy,
    ) -> EngineResult<Vec<EngineEvent>> {
        let events = match directive {
            KeyDirective::AddKey {
                key_id,
                purpose,
                key_type,
            } => {
                if registry.add_key(key_id, purpose, key_type) {
                    vec![EngineEvent::KeyAdded {
                        key_id,
                        purpose,
                        key_type,
                    }]
                } else {
                    Vec::new()
                }
            }
            KeyDirective::RemoveKey { key_id, purpose } => {
                let outcome = registry
                    .remove_key(&key_id, purpose)
                    .map_err(EngineError::from)?;
                vec![EngineEvent::KeyRemoved {
                    key_id,
                    purpose,
                    key_removed: outcome == RemovalOutcome::KeyRemoved,
                }]
            }
            KeyDirective::SetRequiredApprovals { required } => {
                let previous = quorum.set_required(required);
                vec![EngineEvent::RequiredApprovalsChanged { previous, required }]
            }
        };
        Ok(events)
    }
}
