// system-tests/tests/gate_precheck.rs
// ============================================================================
// Module: Gate Precheck Scenario
// Description: Tenant-mismatch and structural-invariant denials at Precheck.
// Purpose: Confirm Precheck denies before ever contacting a Governance SDK.
// Dependencies: gatekeeper-core, gatekeeper-governance-client
// ============================================================================

//! ## Overview
//! Precheck is the only gate stage that never contacts a Governance SDK.
//! This suite builds a gate config for one tenant, runs it against a packet
//! declaring a different tenant, and confirms the denial carries
//! `TENANT_MISMATCH` with no governance evidence attached — then confirms a
//! structurally invalid packet is denied before the tenant check even runs.

mod helpers;

use gatekeeper_core::ActorId;
use gatekeeper_core::DenialCode;
use gatekeeper_core::FailureStage;
use gatekeeper_core::GateConfig;
use gatekeeper_core::GateStateMachine;
use gatekeeper_core::TenantId;
use gatekeeper_governance_client::InMemoryGovernanceSdk;

fn config() -> GateConfig {
    GateConfig {
        tenant_id: TenantId::new(helpers::TENANT),
        actor_id: ActorId::new(helpers::ACTOR),
        allowed_destinations: vec![helpers::DESTINATION.to_owned()],
        operation: "system-tests.publish".to_owned(),
        execution_target: None,
    }
}

#[test]
fn tenant_mismatch_is_denied_at_precheck() {
    let sdk = InMemoryGovernanceSdk::new();
    let gate = GateStateMachine::new(config(), &sdk);

    let mut packet = helpers::sample_packet();
    packet.tenant_id = TenantId::new("a-different-tenant");

    let result = gate.precheck(&packet).expect("precheck should deny a tenant mismatch");
    assert!(!result.allowed);
    assert_eq!(result.denial_code.as_deref(), Some(DenialCode::TenantMismatch.as_str()));
    assert_eq!(result.failure_stage, Some(FailureStage::Precheck));
    assert_eq!(result.packet_hash_sha256.as_deref(), Some("unavailable-in-precheck"));
    assert!(result.governance.is_none());
}

#[test]
fn empty_destinations_is_denied_before_the_tenant_check() {
    let sdk = InMemoryGovernanceSdk::new();
    let gate = GateStateMachine::new(config(), &sdk);

    let mut packet = helpers::sample_packet();
    packet.tenant_id = TenantId::new("a-different-tenant");
    packet.destinations.clear();

    let result = gate.precheck(&packet).expect("precheck should deny an empty destination list");
    assert_eq!(result.denial_code.as_deref(), Some(DenialCode::DestinationsEmpty.as_str()));
}

#[test]
fn valid_packet_passes_precheck() {
    let sdk = InMemoryGovernanceSdk::new();
    let gate = GateStateMachine::new(config(), &sdk);
    assert!(gate.precheck(&helpers::sample_packet()).is_none());
}
