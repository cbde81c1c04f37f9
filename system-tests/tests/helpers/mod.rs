// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared packet, run, and Proof Pack fixtures.
// Purpose: Avoid duplicating fixture construction across scenario suites.
// Dependencies: gatekeeper-core
// ============================================================================

#![allow(dead_code, reason = "not every suite uses every helper")]

use gatekeeper_core::ActorId;
use gatekeeper_core::ApproverSummary;
use gatekeeper_core::ArtifactId;
use gatekeeper_core::CompletedRun;
use gatekeeper_core::CorrelationId;
use gatekeeper_core::DestinationId;
use gatekeeper_core::Mode;
use gatekeeper_core::PayloadKind;
use gatekeeper_core::PayloadRef;
use gatekeeper_core::ProofLedger;
use gatekeeper_core::PublicationPlan;
use gatekeeper_core::PublishPacket;
use gatekeeper_core::RunId;
use gatekeeper_core::TenantId;
use gatekeeper_core::Timestamp;

/// Tenant id shared by every fixture in this package.
pub const TENANT: &str = "keon-public";
/// Actor id shared by every fixture in this package.
pub const ACTOR: &str = "actor-system-tests";
/// Destination every fixture packet is allowlisted against.
pub const DESTINATION: &str = "registry-a";

/// Builds a structurally valid packet for `TENANT`/`ACTOR`/`DESTINATION`.
pub fn sample_packet() -> PublishPacket {
    PublishPacket {
        artifact_id: ArtifactId::new("artifact-system-tests"),
        artifact_type: "library".to_owned(),
        created_at_utc: Timestamp::now(),
        tenant_id: TenantId::new(TENANT),
        correlation_id: CorrelationId::new("corr-system-tests"),
        actor_id: ActorId::new(ACTOR),
        source_refs: vec!["refs/heads/main".to_owned()],
        payload_ref: PayloadRef {
            kind: PayloadKind::RepoPath,
            path: "dist/artifact.tar.gz".to_owned(),
            content_type: None,
            sha256: None,
        },
        destinations: vec![DestinationId::new(DESTINATION)],
        governance: None,
    }
}

/// Builds a minimal completed run with no advisory receipt, the shape
/// produced by a `Prod`-mode pipeline run with nothing to report.
pub fn sample_completed_run(tenant_id: &TenantId, scenario: &str) -> CompletedRun {
    let run_id = RunId::generate();
    let plan = PublicationPlan::all_ship(run_id, tenant_id.clone(), Mode::Prod, vec!["repo-a".to_owned()]);
    let ledger = ProofLedger::new(run_id, tenant_id.clone(), Mode::Prod, Vec::new(), Vec::new());
    let summary = ApproverSummary::derive(&plan, std::collections::BTreeMap::new(), "approved");
    CompletedRun {
        run_id,
        scenario: scenario.to_owned(),
        tenant_id: tenant_id.clone(),
        plan,
        ledger,
        advisory_receipt: None,
        summary,
    }
}
