// crates/gatekeeper-core/src/runtime/proofpack_builder.rs
// ============================================================================
// Module: Gatekeeper Proof Pack Builder
// Description: Serializes a run's artifacts, signs its manifest, and seals
// a multi-run pack index.
// Purpose: Produce the on-disk, independently verifiable Proof Pack.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! One [`ProofPackBuilder`] accumulates one or more completed runs via
//! [`ProofPackBuilder::add_run`], each producing a signed [`RunManifest`]
//! under `runs/<runId>/`, then [`ProofPackBuilder::seal`] emits the top-level
//! `PACK_INDEX.json` binding every run manifest hash into one `packSha256`,
//! plus the public key used to verify every manifest signature.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::ApproverSummary;
use crate::core::ArtifactRecord;
use crate::core::FC_BINDING_CHECKS;
use crate::core::FcBindingRecord;
use crate::core::JudgeAdvisoryReceipt;
use crate::core::PackIndex;
use crate::core::PackIndexRun;
use crate::core::ProofLedger;
use crate::core::PublicationPlan;
use crate::core::RunId;
use crate::core::RunManifest;
use crate::core::TenantId;
use crate::core::Timestamp;
use crate::core::ed25519_signer::Ed25519Signer;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashError;
use crate::core::hashing::canonicalize;
use crate::core::hashing::hash_bytes;
use crate::interfaces::ArtifactIoError;
use crate::interfaces::ArtifactSink;

const PUBLIC_KEY_PATH: &str = "keys/proofpack_signing_public.ed25519";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised building or sealing a Proof Pack.
#[derive(Debug, Error)]
pub enum ProofPackBuilderError {
    /// Canonicalizing an artifact for hashing or signing failed.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Writing an artifact or index file failed.
    #[error(transparent)]
    Io(#[from] ArtifactIoError),
    /// `seal` was called with no runs added.
    #[error("cannot seal a proof pack with zero runs")]
    EmptyPack,
}

// ============================================================================
// SECTION: One Completed Run's Artifacts
// ============================================================================

/// The in-memory artifacts produced for one completed run, ready to be
/// written into a Proof Pack.
pub struct CompletedRun {
    /// The run identifier.
    pub run_id: RunId,
    /// Free-form scenario label, e.g. `"hygiene-sweep"`.
    pub scenario: String,
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// The publication plan.
    pub plan: PublicationPlan,
    /// The sealed ledger.
    pub ledger: ProofLedger,
    /// The signed advisory receipt, present only in `DryRun` runs.
    pub advisory_receipt: Option<JudgeAdvisoryReceipt>,
    /// The derived approver summary.
    pub summary: ApproverSummary,
}

// ============================================================================
// SECTION: Proof Pack Builder
// ============================================================================

/// Accumulates completed runs and seals them into a signed, hash-bound pack.
pub struct ProofPackBuilder<'a> {
    signer: &'a Ed25519Signer,
    sink: &'a dyn ArtifactSink,
    pack_id: String,
    manifest_hashes: Vec<(RunId, String)>,
    run_entries: Vec<PackIndexRun>,
    tenant_id: Option<TenantId>,
}

impl<'a> ProofPackBuilder<'a> {
    /// Builds an empty pack builder bound to a signer, a sink, and a pack id.
    #[must_use]
    pub fn new(signer: &'a Ed25519Signer, sink: &'a dyn ArtifactSink, pack_id: impl Into<String>) -> Self {
        Self {
            signer,
            sink,
            pack_id: pack_id.into(),
            manifest_hashes: Vec::new(),
            run_entries: Vec::new(),
            tenant_id: None,
        }
    }

    /// Writes one completed run's artifacts and signed manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ProofPackBuilderError`] on canonicalization or write failure.
    pub fn add_run(&mut self, run: &CompletedRun) -> Result<(), ProofPackBuilderError> {
        let run_dir = format!("runs/{}/artifacts", run.run_id);
        let mut artifacts = Vec::new();

        artifacts.push(self.write_artifact(&run_dir, "publication-plan.json", &run.plan)?);
        artifacts.push(self.write_artifact(&run_dir, "proof-ledger.json", &run.ledger)?);
        if let Some(receipt) = &run.advisory_receipt {
            artifacts.push(self.write_artifact(&run_dir, "judge-advisory-receipt.json", receipt)?);
        }
        artifacts.push(self.write_artifact(&run_dir, "approver-summary.json", &run.summary)?);
        let markdown = run.summary.to_markdown();
        artifacts.push(self.write_bytes(&run_dir, "approver-summary.md", markdown.into_bytes())?);

        let unsigned = RunManifest::unsigned(run.run_id, run.scenario.clone(), run.tenant_id.clone(), artifacts);
        let canonical = canonicalize(&unsigned)?;
        let signature_value = self.signer.sign_canonical(&canonical);
        let manifest = RunManifest {
            manifest_signature: Some(crate::core::ManifestSignature {
                algorithm: "ed25519".to_owned(),
                key_id: self.signer.key_id().to_owned(),
                public_key_path: PUBLIC_KEY_PATH.to_owned(),
                value: signature_value,
            }),
            ..unsigned
        };

        let manifest_path = format!("runs/{}/RUN_MANIFEST.json", run.run_id);
        let manifest_bytes = canonicalize(&manifest)?;
        self.sink.write(&manifest_path, &manifest_bytes)?;
        let manifest_sha256 = hash_bytes(DEFAULT_HASH_ALGORITHM, &manifest_bytes).value;

        if let Some(receipt) = &run.advisory_receipt {
            let binding = FcBindingRecord {
                fc_issuer_id: receipt.issuer.id.clone(),
                checks: FC_BINDING_CHECKS.iter().map(|check| (*check).to_owned()).collect(),
            };
            let binding_path = format!("runs/{}/verification/fc-binding.json", run.run_id);
            let binding_bytes = canonicalize(&binding)?;
            self.sink.write(&binding_path, &binding_bytes)?;
        }

        self.manifest_hashes.push((run.run_id, manifest_sha256.clone()));
        self.run_entries.push(PackIndexRun {
            run_id: run.run_id,
            scenario: run.scenario.clone(),
            path: manifest_path,
            sha256: manifest_sha256,
        });
        self.tenant_id.get_or_insert_with(|| run.tenant_id.clone());
        Ok(())
    }

    /// Seals the pack: writes `PACK_INDEX.json` and the public signing key.
    ///
    /// # Errors
    ///
    /// Returns [`ProofPackBuilderError::EmptyPack`] if no run was added, and
    /// other [`ProofPackBuilderError`] variants on write failure.
    pub fn seal(self) -> Result<PackIndex, ProofPackBuilderError> {
        if self.manifest_hashes.is_empty() {
            return Err(ProofPackBuilderError::EmptyPack);
        }
        let tenant_id = self.tenant_id.unwrap_or_else(|| TenantId::new(""));

        // `runs` and the manifest-hash concatenation below must use the same
        // order: the verifier recomputes packSha256 from PACK_INDEX.runs's
        // on-disk order rather than re-sorting, so reordering that array
        // (without touching any manifest) is detectable as a seal mismatch.
        let mut run_entries = self.run_entries;
        run_entries.sort_by_key(|entry| entry.run_id);
        let mut manifest_hashes_by_run_id: std::collections::BTreeMap<RunId, String> = self.manifest_hashes.into_iter().collect();
        let concatenated: String = run_entries
            .iter()
            .filter_map(|entry| manifest_hashes_by_run_id.remove(&entry.run_id))
            .collect();
        let pack_sha256 = hash_bytes(DEFAULT_HASH_ALGORITHM, concatenated.as_bytes()).value;

        let index = PackIndex {
            pack_id: self.pack_id,
            created_at: Timestamp::now(),
            tenant_id,
            runs: run_entries,
            pack_sha256,
        };
        let index_bytes = canonicalize(&index)?;
        self.sink.write("PACK_INDEX.json", &index_bytes)?;
        self.sink.write(PUBLIC_KEY_PATH, &self.signer.public_key_bytes())?;
        Ok(index)
    }

    fn write_artifact<T: serde::Serialize>(&self, dir: &str, name: &str, value: &T) -> Result<ArtifactRecord, ProofPackBuilderError> {
        let bytes = canonicalize(value)?;
        self.write_bytes(dir, name, bytes)
    }

    fn write_bytes(&self, dir: &str, name: &str, bytes: Vec<u8>) -> Result<ArtifactRecord, ProofPackBuilderError> {
        let path = format!("{dir}/{name}");
        self.sink.write(&path, &bytes)?;
        let sha256 = hash_bytes(DEFAULT_HASH_ALGORITHM, &bytes).value;
        Ok(ArtifactRecord {
            name: name.to_owned(),
            path,
            sha256,
            bytes: bytes.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Mode;
    use std::cell::RefCell;
    use std::collections::BTreeMap as Map;

    struct MemorySink {
        files: RefCell<Map<String, Vec<u8>>>,
    }

    impl MemorySink {
        fn new() -> Self {
            Self {
                files: RefCell::new(Map::new()),
            }
        }
    }

    impl ArtifactSink for MemorySink {
        fn write(&self, path: &str, bytes: &[u8]) -> Result<(), ArtifactIoError> {
            self.files.borrow_mut().insert(path.to_owned(), bytes.to_vec());
            Ok(())
        }
    }

    fn sample_run() -> CompletedRun {
        let run_id = RunId::generate();
        let tenant_id = TenantId::new("keon-public");
        let plan = PublicationPlan::all_ship(run_id, tenant_id.clone(), Mode::DryRun, vec!["repo-a".to_owned()]);
        let ledger = ProofLedger::new(run_id, tenant_id.clone(), Mode::DryRun, Vec::new(), Vec::new());
        let summary = ApproverSummary::derive(&plan, std::collections::BTreeMap::new(), "approved");
        CompletedRun {
            run_id,
            scenario: "hygiene-sweep".to_owned(),
            tenant_id,
            plan,
            ledger,
            advisory_receipt: None,
            summary,
        }
    }

    #[test]
    fn seal_produces_pack_index_with_matching_run_count() {
        let signer = Ed25519Signer::generate();
        let sink = MemorySink::new();
        let mut builder = ProofPackBuilder::new(&signer, &sink, "pack-1");
        builder.add_run(&sample_run()).expect("add_run");
        builder.add_run(&sample_run()).expect("add_run");
        let index = builder.seal().expect("seal");
        assert_eq!(index.runs.len(), 2);
        assert!(!index.pack_sha256.is_empty());
        assert!(sink.files.borrow().contains_key(PUBLIC_KEY_PATH));
    }

    #[test]
    fn seal_with_no_runs_is_rejected() {
        let signer = Ed25519Signer::generate();
        let sink = MemorySink::new();
        let builder = ProofPackBuilder::new(&signer, &sink, "pack-1");
        assert!(matches!(builder.seal(), Err(ProofPackBuilderError::EmptyPack)));
    }
}
