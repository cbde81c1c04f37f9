// system-tests/tests/proofpack_tamper.rs
// ============================================================================
// Module: Proof Pack Tamper Scenario
// Description: Builds a Proof Pack to disk, tampers one artifact byte, then
// independently re-verifies it.
// Purpose: Confirm the verifier's re-derivation catches on-disk tampering
// the builder itself cannot observe.
// Dependencies: gatekeeper-core, tempfile
// ============================================================================

//! ## Overview
//! `ProofPackVerifier` trusts nothing the pack claims about itself; every
//! check recomputes a value from raw bytes. This suite seals a pack with
//! `FileArtifactSink`, flips one byte of `publication-plan.json` on disk
//! with ordinary filesystem writes, then re-reads the pack with a fresh
//! `FileArtifactReader` and confirms the tamper surfaces as a hash mismatch.

mod helpers;

use gatekeeper_core::ArtifactReader;
use gatekeeper_core::Ed25519Signer;
use gatekeeper_core::FileArtifactReader;
use gatekeeper_core::FileArtifactSink;
use gatekeeper_core::ProofPackBuilder;
use gatekeeper_core::ProofPackVerifier;
use gatekeeper_core::TenantId;

#[test]
fn tampering_an_artifact_byte_fails_the_hash_check() {
    let pack_root = tempfile::tempdir().expect("tempdir");
    let signer = Ed25519Signer::generate();
    let sink = FileArtifactSink::new(pack_root.path());
    let tenant_id = TenantId::new(helpers::TENANT);
    let run = helpers::sample_completed_run(&tenant_id, "system-tests-tamper");
    let run_id = run.run_id;

    let mut builder = ProofPackBuilder::new(&signer, &sink, "system-tests-pack-tamper");
    builder.add_run(&run).expect("add_run");
    builder.seal().expect("seal");

    let plan_path = pack_root.path().join(format!("runs/{run_id}/artifacts/publication-plan.json"));
    let mut bytes = std::fs::read(&plan_path).expect("read plan artifact");
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&plan_path, &bytes).expect("rewrite plan artifact");

    let reader = FileArtifactReader::new(pack_root.path());
    let report = ProofPackVerifier::new(&reader).verify();
    assert!(!report.passed(), "tampering should be caught");
    assert!(report.failures.iter().any(|failure| failure.check == "artifact_hash_matches"), "failures: {:?}", report.failures);
}

#[test]
fn untampered_pack_verifies_cleanly_from_disk() {
    let pack_root = tempfile::tempdir().expect("tempdir");
    let signer = Ed25519Signer::generate();
    let sink = FileArtifactSink::new(pack_root.path());
    let tenant_id = TenantId::new(helpers::TENANT);
    let run = helpers::sample_completed_run(&tenant_id, "system-tests-clean");

    let mut builder = ProofPackBuilder::new(&signer, &sink, "system-tests-pack-clean");
    builder.add_run(&run).expect("add_run");
    builder.seal().expect("seal");

    let reader = FileArtifactReader::new(pack_root.path());
    let report = ProofPackVerifier::new(&reader).verify();
    assert!(report.passed(), "unexpected failures: {:?}", report.failures);
    assert!(report.checks_attempted > 0);
    assert!(reader.read("PACK_INDEX.json").is_ok());
}
