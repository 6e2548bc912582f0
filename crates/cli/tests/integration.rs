//! Integration tests for the KeyGate CLI commands

use std::path::PathBuf;

use ed25519_dalek::SigningKey;
use keygate_cli::{commands, Scenario, StepOutcome};
use keygate_core::{Address, Amount, ExecutionId, KeyId};
use keygate_engine::{ApprovalStatus, DispatchOutcome, EngineConfig, EngineError};
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn bundled_scenario() -> Scenario {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios/quorum.json");
    Scenario::from_file(&path).unwrap()
}

fn config_in(dir: &TempDir) -> EngineConfig {
    EngineConfig {
        audit_dir: dir.path().join("audit"),
        ..EngineConfig::default()
    }
}

/// Test: bundled scenario → audit log → audit
#[tokio::test]
async fn test_run_bundled_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);

    let report = commands::run(&bundled_scenario(), &config).await.unwrap();
    let outcomes = &report.outcomes;

    assert_eq!(outcomes[3], StepOutcome::Proposed(ExecutionId::new(2)));
    assert_eq!(
        outcomes[4],
        StepOutcome::Approval(ApprovalStatus::Pending {
            approvals: 1,
            required: 2
        })
    );
    assert!(matches!(
        outcomes[5],
        StepOutcome::Rejected(EngineError::AlreadyApproved { .. })
    ));
    assert_eq!(
        outcomes[6],
        StepOutcome::Approval(ApprovalStatus::Dispatched(DispatchOutcome::Succeeded))
    );
    assert_eq!(
        outcomes[7],
        StepOutcome::Rejected(EngineError::AlreadyExecuted(ExecutionId::new(2)))
    );
    // Action keys can neither propose nor approve self-calls
    assert!(matches!(&outcomes[8], StepOutcome::Rejected(e) if e.is_unauthorized()));
    assert!(matches!(&outcomes[10], StepOutcome::Rejected(e) if e.is_unauthorized()));
    assert!(matches!(
        outcomes[12],
        StepOutcome::Approval(ApprovalStatus::Dispatched(DispatchOutcome::Succeeded))
    ));
    // Alice lost her action purpose
    assert!(matches!(&outcomes[13], StepOutcome::Rejected(e) if e.is_unauthorized()));

    assert_eq!(report.stats.total, 4);
    assert_eq!(report.stats.executed, 4);
    assert_eq!(report.reserve, Amount::new(dec!(9.9)).unwrap());
    assert_eq!(
        report.balances.get(&Address::from("wallet")),
        Some(&Amount::new(dec!(0.1)).unwrap())
    );

    let summary = commands::audit(&config.audit_dir).unwrap();
    assert_eq!(summary.records, report.events_written);
    assert_eq!(summary.requested, 4);
    assert_eq!(summary.executed, 4);
    assert_eq!(summary.pending(), 0);
}

#[tokio::test]
async fn test_run_refuses_used_audit_dir() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);

    commands::run(&bundled_scenario(), &config).await.unwrap();
    assert!(commands::run(&bundled_scenario(), &config).await.is_err());
}

#[test]
fn test_keygen_and_key_id_agree() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("test.key");

    let generated = commands::keygen(&output).unwrap();

    let seed = hex::decode(std::fs::read_to_string(&output).unwrap()).unwrap();
    let seed: [u8; 32] = seed.try_into().unwrap();
    let public_key = SigningKey::from_bytes(&seed).verifying_key();

    let derived = commands::key_id(&hex::encode(public_key.as_bytes())).unwrap();
    assert_eq!(derived, generated);
    assert_eq!(derived, KeyId::from_public_key(&public_key));
}

#[test]
fn test_key_id_rejects_bad_input() {
    assert!(commands::key_id("not hex").is_err());
    assert!(commands::key_id("abcd").is_err());
}

#[test]
fn test_audit_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    let summary = commands::audit(temp_dir.path()).unwrap();
    assert_eq!(summary.records, 0);
}
