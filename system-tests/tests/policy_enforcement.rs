// system-tests/tests/policy_enforcement.rs
// ============================================================================
// Module: Policy Enforcement Scenario
// Description: Dry-run pipeline over a simulated direct-push-to-main
// violation.
// Purpose: Confirm the hardcoded deny rule blocks the plan without failing
// the run.
// Dependencies: gatekeeper-core, tokio
// ============================================================================

//! ## Overview
//! The policy evaluator denies a direct push to `main` unless the intent is
//! an `OpenPr`. A blocked intent still reaches Seal; only the publication
//! plan records the denial, split between `wouldShip` and `wouldNotShip`.

mod helpers;

use gatekeeper_core::FcSigner;
use gatekeeper_core::IntentStore;
use gatekeeper_core::MarketOpsRun;
use gatekeeper_core::Mode;
use gatekeeper_core::NullEmitter;
use gatekeeper_core::NullSinkPort;
use gatekeeper_core::PipelineOrchestrator;
use gatekeeper_core::TenantId;

#[tokio::test]
async fn direct_push_main_violation_blocks_the_plan_but_not_the_run() {
    let repo = tempfile::tempdir().expect("tempdir");
    tokio::fs::write(repo.path().join("README.md"), b"## Installation\n## Usage\n## License\n").await.expect("write readme");
    tokio::fs::write(repo.path().join("CODEOWNERS"), b"* @team").await.expect("write codeowners");
    tokio::fs::write(repo.path().join(".editorconfig"), b"root = true").await.expect("write editorconfig");

    let fc_signer = FcSigner::new("fc-key-1", b"system-tests-key".to_vec()).expect("fc signer");
    let emitter = NullEmitter;
    let orchestrator = PipelineOrchestrator::new(&emitter, &fc_signer);
    let store = IntentStore::new();
    let port = NullSinkPort::new(&store);

    let mut input = serde_json::Map::new();
    input.insert("repos".to_owned(), serde_json::json!([repo.path().to_string_lossy()]));
    input.insert("simulateViolation".to_owned(), serde_json::json!("direct_push_main"));
    let run = MarketOpsRun::start(TenantId::new(helpers::TENANT), Mode::DryRun, input, None);

    let result = orchestrator.run(&run, &port, &store).await;
    assert!(result.success, "a policy denial blocks the plan, not the run: {:?}", result.error_message);

    let plan = result.plan.expect("plan should be present on a successful run");
    assert!(plan.would_ship.is_empty(), "the violating candidate must not ship");
    assert!(!plan.would_not_ship.is_empty(), "the violating candidate must be recorded as blocked");

    let ledger = result.ledger.expect("ledger should be present");
    assert!(ledger.is_sealed());

    let intents = store.snapshot_for_run(run.run_id);
    assert_eq!(intents.len(), 2, "one OpenPr intent for the discovered repo plus the injected TagRepo violation");
    let denied: Vec<_> = intents.iter().filter(|intent| intent.blocked_by_policy).collect();
    assert_eq!(denied.len(), 1, "only the injected TagRepo violation is denied by policy");
    assert!(denied[0].policy_denial_reasons.iter().any(|reason| reason.contains("policy.direct_push_main.denied.v1")));

    let advisory = result.advisory_receipt.expect("advisory receipt");
    assert!(advisory.reasons.iter().any(|reason| reason.contains("policy.direct_push_main.denied.v1")), "advisory reasons must surface the denial");
}

#[tokio::test]
async fn no_violation_flag_ships_every_candidate() {
    let fc_signer = FcSigner::new("fc-key-1", b"system-tests-key".to_vec()).expect("fc signer");
    let emitter = NullEmitter;
    let orchestrator = PipelineOrchestrator::new(&emitter, &fc_signer);
    let store = IntentStore::new();
    let port = NullSinkPort::new(&store);

    let mut input = serde_json::Map::new();
    input.insert("repos".to_owned(), serde_json::json!(["/tmp/system-tests-repo-b"]));
    let run = MarketOpsRun::start(TenantId::new(helpers::TENANT), Mode::DryRun, input, None);

    let result = orchestrator.run(&run, &port, &store).await;
    assert!(result.success);
    let plan = result.plan.expect("plan");
    assert!(plan.would_not_ship.is_empty(), "nothing should be blocked without a simulated violation");
}
