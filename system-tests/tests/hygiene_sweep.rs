// system-tests/tests/hygiene_sweep.rs
// ============================================================================
// Module: Hygiene Sweep Scenario
// Description: Dry-run discovery and pipeline sweep over artifact trees.
// Purpose: Confirm discovery flags hygiene issues without blocking the run.
// Dependencies: gatekeeper-core, tempfile, tokio
// ============================================================================

//! ## Overview
//! A dry-run pipeline never mutates anything outside the repository paths it
//! is told to scan. This suite points discovery at a directory with an
//! incomplete README and no CODEOWNERS/.editorconfig, checks the reported
//! issue types, then drives a full dry-run pipeline over an empty repo list
//! and confirms it still reaches Seal with an advisory receipt.

mod helpers;

use gatekeeper_core::IntentStore;
use gatekeeper_core::MarketOpsRun;
use gatekeeper_core::Mode;
use gatekeeper_core::NullEmitter;
use gatekeeper_core::NullSinkPort;
use gatekeeper_core::PipelineOrchestrator;
use gatekeeper_core::SideEffectIntent;
use gatekeeper_core::TenantId;
use gatekeeper_core::pipeline_stages;

#[tokio::test]
async fn hygiene_sweep_flags_missing_housekeeping_files() {
    let repo_dir = tempfile::tempdir().expect("tempdir");
    tokio::fs::write(repo_dir.path().join("README.md"), b"incomplete").await.expect("write readme");

    let mut input = serde_json::Map::new();
    input.insert("repos".to_owned(), serde_json::json!([repo_dir.path().to_string_lossy()]));
    let run = MarketOpsRun::start(TenantId::new(helpers::TENANT), Mode::DryRun, input, None);

    let discovered = pipeline_stages::discover(&run).await;
    assert_eq!(discovered.len(), 1);
    let issue_types: Vec<&str> = discovered[0].issues.iter().map(|issue| issue.issue_type.as_str()).collect();
    assert!(issue_types.contains(&"incomplete_readme"), "found: {issue_types:?}");
    assert!(issue_types.contains(&"missing_codeowners"), "found: {issue_types:?}");
    assert!(issue_types.contains(&"missing_editorconfig"), "found: {issue_types:?}");
}

#[tokio::test]
async fn hygiene_sweep_dry_run_seals_a_run_with_no_side_effects() {
    let fc_signer = gatekeeper_core::FcSigner::new("fc-key-1", b"system-tests-key".to_vec()).expect("fc signer");
    let emitter = NullEmitter;
    let orchestrator = PipelineOrchestrator::new(&emitter, &fc_signer);
    let store = IntentStore::new();
    let port = NullSinkPort::new(&store);

    let mut input = serde_json::Map::new();
    input.insert("repos".to_owned(), serde_json::json!([]));
    let run = MarketOpsRun::start(TenantId::new(helpers::TENANT), Mode::DryRun, input, None);

    let result = orchestrator.run(&run, &port, &store).await;
    assert!(result.success, "dry run unexpectedly failed: {:?}", result.error_message);
    assert!(result.advisory_receipt.is_some(), "dry run should mint an advisory receipt");
    assert!(result.ledger.is_sealed());
    assert!(store.snapshot_for_run(run.run_id).iter().all(SideEffectIntent::upholds_mode_invariants));
}

#[tokio::test]
async fn hygiene_sweep_dry_run_records_one_blocked_intent_per_discovered_repo() {
    let repo_a = tempfile::tempdir().expect("tempdir a");
    let repo_b = tempfile::tempdir().expect("tempdir b");
    tokio::fs::write(repo_a.path().join("README.md"), b"incomplete").await.expect("write readme a");
    tokio::fs::write(repo_b.path().join("README.md"), b"## Installation\n## Usage\n## License\n").await.expect("write readme b");
    tokio::fs::write(repo_b.path().join("CODEOWNERS"), b"* @team").await.expect("write codeowners b");
    tokio::fs::write(repo_b.path().join(".editorconfig"), b"root = true").await.expect("write editorconfig b");

    let fc_signer = gatekeeper_core::FcSigner::new("fc-key-1", b"system-tests-key".to_vec()).expect("fc signer");
    let emitter = NullEmitter;
    let orchestrator = PipelineOrchestrator::new(&emitter, &fc_signer);
    let store = IntentStore::new();
    let port = NullSinkPort::new(&store);

    let mut input = serde_json::Map::new();
    input.insert("repos".to_owned(), serde_json::json!([repo_a.path().to_string_lossy(), repo_b.path().to_string_lossy()]));
    let run = MarketOpsRun::start(TenantId::new(helpers::TENANT), Mode::DryRun, input, None);

    let result = orchestrator.run(&run, &port, &store).await;
    assert!(result.success, "dry run unexpectedly failed: {:?}", result.error_message);

    let intents = store.snapshot_for_run(run.run_id);
    assert_eq!(intents.len(), 2, "one OpenPr intent per discovered repo, regardless of hygiene issues found");
    assert!(intents.iter().all(|intent| intent.blocked_by_mode), "every dry-run intent must be blocked by mode");
    assert!(intents.iter().all(|intent| !intent.blocked_by_policy), "no policy violation was simulated");
    assert!(intents.iter().all(SideEffectIntent::upholds_mode_invariants));

    let plan = result.plan.expect("plan");
    assert_eq!(plan.would_ship.len(), 2, "both candidates should ship absent a policy denial");
    assert!(plan.would_not_ship.is_empty());

    let advisory = result.advisory_receipt.expect("advisory receipt");
    assert!(!advisory.enforceable, "a dry-run advisory is never enforceable");
}
