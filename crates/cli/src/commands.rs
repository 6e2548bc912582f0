//! Command implementations

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use ed25519_dalek::{SigningKey, VerifyingKey};
use keygate_core::{Address, Amount, ExecutionId, KeyId};
use keygate_engine::{
    ApprovalStatus, AuthorizationEngine, DispatchOutcome, EngineConfig, EngineError,
    InMemoryLedger, QueueStats,
};
use keygate_events::{verify_single_dispatch, AuditSummary, EventReader, EventStore};
use keygate_registry::KeyDirective;
use tracing::{info, warn};

use crate::scenario::{resolve_key, Scenario, Step};

/// Result of one scripted step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Proposed(ExecutionId),
    Approval(ApprovalStatus),
    ThresholdChanged(u32),
    Rejected(EngineError),
}

/// Everything `run` produced
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<StepOutcome>,
    pub events_written: usize,
    pub reserve: Amount,
    pub balances: BTreeMap<Address, Amount>,
    pub stats: QueueStats,
}

/// Generate an Ed25519 key, store its seed and return the key id
pub fn keygen(output: &Path) -> anyhow::Result<KeyId> {
    let mut rng = rand::thread_rng();
    let signing_key = SigningKey::generate(&mut rng);
    let verifying_key = signing_key.verifying_key();
    let key_id = KeyId::from_public_key(&verifying_key);

    std::fs::write(output, hex::encode(signing_key.to_bytes()))
        .with_context(|| format!("cannot write {}", output.display()))?;

    println!("✅ Generated Ed25519 key");
    println!("   Seed saved to: {}", output.display());
    println!("   Public key: {}", hex::encode(verifying_key.as_bytes()));
    println!("   Key id: {}", key_id);

    Ok(key_id)
}

/// Derive the key id of a hex-encoded Ed25519 public key
pub fn key_id(public_key_hex: &str) -> anyhow::Result<KeyId> {
    let bytes = hex::decode(public_key_hex.trim().trim_start_matches("0x"))
        .context("public key is not valid hex")?;
    let len = bytes.len();
    let bytes: [u8; 32] = match bytes.try_into() {
        Ok(bytes) => bytes,
        Err(_) => bail!("public key must be 32 bytes, got {}", len),
    };
    let verifying_key =
        VerifyingKey::from_bytes(&bytes).context("not a valid Ed25519 public key")?;

    Ok(KeyId::from_public_key(&verifying_key))
}

/// Replay a scenario against a fresh engine and persist its events
pub async fn run(scenario: &Scenario, config: &EngineConfig) -> anyhow::Result<RunReport> {
    let mut config = config.clone();
    if let Some(required) = scenario.required_approvals {
        config.required_approvals = required;
    }

    // Execution ids and sequences restart with every engine
    if EventReader::from_directory(&config.audit_dir)?.file_count() > 0 {
        bail!(
            "audit log at {} already holds a run; choose another audit directory",
            config.audit_dir.display()
        );
    }

    let ledger = Arc::new(InMemoryLedger::new(scenario.reserve));
    let mut engine = AuthorizationEngine::new(
        &config,
        scenario.management_key_id(),
        scenario.key_type,
        ledger.clone(),
    );

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = match apply_step(&mut engine, step).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(step = index, error = %e, "Step rejected");
                StepOutcome::Rejected(e)
            }
        };
        println!("{:>3}. {:<48} {}", index, step.describe(), render(&outcome));
        outcomes.push(outcome);
    }

    let mut store = EventStore::new(&config.audit_dir)?;
    let events_written = store.append_all(&engine.drain_events())?;
    store.close()?;
    info!(events = events_written, dir = %config.audit_dir.display(), "Audit log updated");

    let reserve = ledger.reserve().await;
    let balances = ledger.balances().await;
    let stats = engine.stats();

    println!();
    println!(
        "Executions: {} total, {} pending, {} executed ({} failed)",
        stats.total, stats.pending, stats.executed, stats.failed
    );
    println!("Reserve: {}", reserve);
    for (address, balance) in &balances {
        println!("   {:<20} {}", address, balance);
    }

    Ok(RunReport {
        outcomes,
        events_written,
        reserve,
        balances,
        stats,
    })
}

async fn apply_step(engine: &mut AuthorizationEngine, step: &Step) -> Result<StepOutcome, EngineError> {
    let caller = step.caller();
    match step {
        Step::Execute {
            target,
            value,
            payload,
            ..
        } => {
            let id = engine
                .execute(&caller, Address::from(target.as_str()), *value, payload.as_bytes().to_vec())
                .await?;
            Ok(StepOutcome::Proposed(id))
        }
        Step::AddKey {
            key,
            purpose,
            key_type,
            ..
        } => {
            let directive = KeyDirective::add_key(resolve_key(key), *purpose, *key_type);
            propose_self_call(engine, &caller, directive).await
        }
        Step::RemoveKey { key, purpose, .. } => {
            let directive = KeyDirective::remove_key(resolve_key(key), *purpose);
            propose_self_call(engine, &caller, directive).await
        }
        Step::Approve { execution, .. } => {
            let status = engine.approve(&caller, ExecutionId::new(*execution)).await?;
            Ok(StepOutcome::Approval(status))
        }
        Step::SetRequiredApprovals { required, .. } => {
            engine.set_required_approvals(&caller, *required)?;
            Ok(StepOutcome::ThresholdChanged(*required))
        }
    }
}

async fn propose_self_call(
    engine: &mut AuthorizationEngine,
    caller: &KeyId,
    directive: KeyDirective,
) -> Result<StepOutcome, EngineError> {
    let target = engine.address().clone();
    let id = engine
        .execute(caller, target, Amount::ZERO, directive.encode())
        .await?;
    Ok(StepOutcome::Proposed(id))
}

fn render(outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Proposed(id) => format!("proposed #{}", id),
        StepOutcome::Approval(ApprovalStatus::Pending { approvals, required }) => {
            format!("pending {}/{}", approvals, required)
        }
        StepOutcome::Approval(ApprovalStatus::Dispatched(DispatchOutcome::Succeeded)) => {
            "✅ dispatched".to_string()
        }
        StepOutcome::Approval(ApprovalStatus::Dispatched(DispatchOutcome::Failed { reason })) => {
            format!("❌ dispatch failed: {}", reason)
        }
        StepOutcome::Approval(ApprovalStatus::Dispatched(DispatchOutcome::Abandoned)) => {
            "⚠️ dispatch abandoned".to_string()
        }
        StepOutcome::ThresholdChanged(required) => format!("threshold = {}", required),
        StepOutcome::Rejected(e) => format!("rejected: {}", e),
    }
}

/// Verify the audit log in `dir`
pub fn audit(dir: &Path) -> anyhow::Result<AuditSummary> {
    let reader = EventReader::from_directory(dir)?;
    let records = reader.read_all()?;
    let summary = verify_single_dispatch(&records)?;

    println!(
        "✅ Audit passed: {} records in {} files",
        summary.records,
        reader.file_count()
    );
    println!(
        "   {} requested, {} executed ({} failed), {} pending",
        summary.requested,
        summary.executed,
        summary.failed,
        summary.pending()
    );

    Ok(summary)
}
