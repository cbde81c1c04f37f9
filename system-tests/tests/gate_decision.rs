// system-tests/tests/gate_decision.rs
// ============================================================================
// Module: Gate Decision Scenario
// Description: Full six-stage gate runs against the in-memory reference SDK.
// Purpose: Confirm an approved decision allows the packet and a rejected
// decision denies it with a stable denial code, with an audit trail written
// to disk either way.
// Dependencies: gatekeeper-core, gatekeeper-governance-client, tempfile, tokio
// ============================================================================

//! ## Overview
//! `InMemoryGovernanceSdk` is this project's deterministic reference backend:
//! `ApproveAll` approves every decision, `RejectTenant` denies one tenant.
//! Both paths run through `GateStateMachine::run` end to end, with a
//! `FileArtifactSink` attached so the EvidencePack stage's receipt is
//! actually materialized on disk for the allowed case.

mod helpers;

use gatekeeper_core::ActorId;
use gatekeeper_core::DenialCode;
use gatekeeper_core::FailureStage;
use gatekeeper_core::FileArtifactSink;
use gatekeeper_core::GateConfig;
use gatekeeper_core::GateStateMachine;
use gatekeeper_core::TenantId;
use gatekeeper_governance_client::DecisionRule;
use gatekeeper_governance_client::InMemoryGovernanceSdk;
use tokio_util::sync::CancellationToken;

fn config() -> GateConfig {
    GateConfig {
        tenant_id: TenantId::new(helpers::TENANT),
        actor_id: ActorId::new(helpers::ACTOR),
        allowed_destinations: vec![helpers::DESTINATION.to_owned()],
        operation: "system-tests.publish".to_owned(),
        execution_target: None,
    }
}

#[tokio::test]
async fn approved_decision_allows_and_writes_an_audit_trail() {
    let audit_root = tempfile::tempdir().expect("tempdir");
    let sink = FileArtifactSink::new(audit_root.path());
    let sdk = InMemoryGovernanceSdk::new();
    let gate = GateStateMachine::new(config(), &sdk).with_audit_sink(&sink);
    let cancellation = CancellationToken::new();

    let result = gate.run(helpers::sample_packet(), &cancellation).await;
    assert!(result.allowed, "expected allow, got denial: {:?}/{:?}", result.denial_code, result.denial_message);
    assert!(result.packet_hash_sha256.is_some());
    let governance = result.governance.expect("governance evidence present on allow");
    assert_eq!(governance.outcome, "approved");
    if let Some(receipt_path) = &governance.receipt_path {
        assert!(audit_root.path().join(receipt_path).exists(), "receipt should be materialized under the audit root");
    }
}

#[tokio::test]
async fn rejected_tenant_is_denied_at_decision() {
    let sdk = InMemoryGovernanceSdk::with_rule(DecisionRule::RejectTenant(TenantId::new(helpers::TENANT)));
    let gate = GateStateMachine::new(config(), &sdk);
    let cancellation = CancellationToken::new();

    let result = gate.run(helpers::sample_packet(), &cancellation).await;
    assert!(!result.allowed);
    assert_eq!(result.denial_code.as_deref(), Some(DenialCode::DecisionNotApproved.as_str()));
    assert_eq!(result.failure_stage, Some(FailureStage::Decision));
    assert!(result.governance.is_none());
}

#[tokio::test]
async fn reject_all_denies_every_tenant() {
    let sdk = InMemoryGovernanceSdk::with_rule(DecisionRule::RejectAll);
    let gate = GateStateMachine::new(config(), &sdk);
    let cancellation = CancellationToken::new();

    let result = gate.run(helpers::sample_packet(), &cancellation).await;
    assert!(!result.allowed);
    assert_eq!(result.failure_stage, Some(FailureStage::Decision));
}
