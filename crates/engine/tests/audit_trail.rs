//! Engine events persisted to the JSONL audit log

use std::sync::Arc;

use anyhow::Result;
use keygate_core::{Address, Amount, KeyId, KeyType, Purpose};
use keygate_engine::{AuthorizationEngine, EngineConfig, EngineEvent, RejectingSink};
use keygate_events::{verify_single_dispatch, EventReader, EventStore};
use keygate_registry::KeyDirective;
use tempfile::TempDir;

fn key(name: &str) -> KeyId {
    KeyId::from_credential(name.as_bytes())
}

#[tokio::test]
async fn test_drained_events_replay_and_audit() -> Result<()> {
    let dir = TempDir::new()?;
    let config = EngineConfig {
        required_approvals: 1,
        audit_dir: dir.path().to_path_buf(),
        ..EngineConfig::default()
    };
    let sink = Arc::new(RejectingSink::new("offline"));
    let mut engine = AuthorizationEngine::new(&config, key("root"), KeyType::Ed25519, sink);

    let this = engine.address().clone();
    engine
        .execute(
            &key("root"),
            this,
            Amount::ZERO,
            KeyDirective::add_key(key("alice"), Purpose::Action, KeyType::Ed25519).encode(),
        )
        .await?;
    engine.set_required_approvals(&key("root"), 2)?;

    let transfer = engine
        .execute(&key("alice"), Address::from("wallet"), Amount::ZERO, vec![])
        .await?;
    engine.approve(&key("alice"), transfer).await?;
    engine.approve(&key("root"), transfer).await?;

    let mut store = EventStore::new(&config.audit_dir)?;
    let written = store.append_all(&engine.drain_events())?;
    store.close()?;

    let records = EventReader::from_directory(&config.audit_dir)?.read_all()?;
    assert_eq!(records.len(), written);

    let summary = verify_single_dispatch(&records)?;
    assert_eq!(summary.requested, 2);
    assert_eq!(summary.executed, 2);
    // The transfer hit a rejecting sink
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.pending(), 0);

    let added = records
        .iter()
        .filter(|r| matches!(r.event, EngineEvent::KeyAdded { .. }))
        .count();
    assert_eq!(added, 1);
    Ok(())
}

#[tokio::test]
async fn test_batches_continue_sequence_across_drains() -> Result<()> {
    let dir = TempDir::new()?;
    let mut engine = AuthorizationEngine::new(
        &EngineConfig::default(),
        key("root"),
        KeyType::Ed25519,
        Arc::new(RejectingSink::new("offline")),
    );
    let mut store = EventStore::new(dir.path())?;

    engine
        .execute(&key("root"), Address::from("a"), Amount::ZERO, vec![])
        .await?;
    store.append_all(&engine.drain_events())?;

    engine
        .execute(&key("root"), Address::from("b"), Amount::ZERO, vec![])
        .await?;
    store.append_all(&engine.drain_events())?;
    store.close()?;

    let reader = EventReader::from_directory(dir.path())?;
    assert_eq!(reader.last_sequence()?, Some(6));
    assert_eq!(verify_single_dispatch(&reader.read_all()?)?.executed, 2);
    Ok(())
}
