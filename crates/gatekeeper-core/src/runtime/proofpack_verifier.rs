// crates/gatekeeper-core/src/runtime/proofpack_verifier.rs
// ============================================================================
// Module: Gatekeeper Proof Pack Verifier
// Description: Independent, fail-closed re-derivation of every Proof Pack seal.
// Purpose: Let a reader who trusts nothing confirm a pack was not tampered with.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! [`ProofPackVerifier`] makes no assumption that a pack is well-formed: every
//! step recomputes a value from raw bytes and compares it to what the pack
//! claims. A single pass covers every run in `PACK_INDEX.json`, then the
//! pack-level seal and single-tenant rule. Nothing here mutates the pack;
//! failures accumulate into a [`VerificationReport`] rather than aborting the
//! pass, so one bad run does not hide problems in the others.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::ApproverSummary;
use crate::core::ArtifactRecord;
use crate::core::FcBindingRecord;
use crate::core::FcSigner;
use crate::core::JudgeAdvisoryReceipt;
use crate::core::KEY_ID_PREFIX;
use crate::core::PackIndex;
use crate::core::PackIndexRun;
use crate::core::ProofLedger;
use crate::core::PublicationPlan;
use crate::core::RunId;
use crate::core::RunManifest;
use crate::core::ed25519_signer::Ed25519Signer;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::canonicalize;
use crate::core::hashing::hash_bytes;
use crate::interfaces::ArtifactReader;

// ============================================================================
// SECTION: Check Failure / Verification Report
// ============================================================================

/// One failed check, scoped to a run when the check is per-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckFailure {
    /// The run this failure belongs to, or `None` for a pack-level check.
    pub run_id: Option<RunId>,
    /// Stable, machine-readable name of the check that failed.
    pub check: String,
    /// Human-readable detail.
    pub message: String,
}

/// The outcome of one full verification pass over a Proof Pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// Total checks attempted, including the ones that failed.
    pub checks_attempted: usize,
    /// Total checks that failed.
    pub checks_failed: usize,
    /// Ordered list of failures, in the order they were discovered.
    pub failures: Vec<CheckFailure>,
}

impl VerificationReport {
    /// Builds an empty report.
    fn empty() -> Self {
        Self {
            checks_attempted: 0,
            checks_failed: 0,
            failures: Vec::new(),
        }
    }

    /// Records one attempted check that passed.
    fn pass(&mut self) {
        self.checks_attempted += 1;
    }

    /// Records one attempted check that failed.
    fn fail(&mut self, run_id: Option<RunId>, check: &str, message: impl Into<String>) {
        self.checks_attempted += 1;
        self.checks_failed += 1;
        self.failures.push(CheckFailure {
            run_id,
            check: check.to_owned(),
            message: message.into(),
        });
    }

    /// Returns `true` when every attempted check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks_failed == 0
    }
}

// ============================================================================
// SECTION: Proof Pack Verifier
// ============================================================================

/// Independently re-verifies a Proof Pack read back through an
/// [`ArtifactReader`]. The optional FC signer enables the HMAC sub-check in
/// step 5; without it, that one check is skipped (not failed), the same way
/// a reader without the trust bundle would report it.
pub struct ProofPackVerifier<'a> {
    reader: &'a dyn ArtifactReader,
    fc_signer: Option<&'a FcSigner>,
}

impl<'a> ProofPackVerifier<'a> {
    /// Builds a verifier bound to a reader, with no FC signer configured.
    #[must_use]
    pub fn new(reader: &'a dyn ArtifactReader) -> Self {
        Self {
            reader,
            fc_signer: None,
        }
    }

    /// Attaches an FC signer, enabling the HMAC sub-check of the optional
    /// `fc-binding.json` cross-checks.
    #[must_use]
    pub fn with_fc_signer(mut self, signer: &'a FcSigner) -> Self {
        self.fc_signer = Some(signer);
        self
    }

    /// Runs the full verification pass: every run in `PACK_INDEX.json`, then
    /// the pack-level seal and single-tenant rule.
    #[must_use]
    pub fn verify(&self) -> VerificationReport {
        let mut report = VerificationReport::empty();

        let index_bytes = match self.reader.read("PACK_INDEX.json") {
            Ok(bytes) => bytes,
            Err(err) => {
                report.fail(None, "pack_index_readable", err.to_string());
                return report;
            }
        };
        report.pass();

        let index: PackIndex = match serde_json::from_slice(&index_bytes) {
            Ok(index) => {
                report.pass();
                index
            }
            Err(err) => {
                report.fail(None, "pack_index_parseable", err.to_string());
                return report;
            }
        };

        let mut manifest_hashes: Vec<String> = Vec::with_capacity(index.runs.len());
        for run_entry in &index.runs {
            if let Some(manifest_sha256) = self.verify_run(run_entry, &mut report) {
                manifest_hashes.push(manifest_sha256);
            }
        }

        self.verify_pack_seal(&index, &manifest_hashes, &mut report);
        self.verify_single_tenant(&index, &mut report);

        report
    }

    /// Runs steps 1-6 for one run, returning the recomputed on-disk manifest
    /// hash when the manifest itself was at least readable and parseable.
    fn verify_run(&self, run_entry: &PackIndexRun, report: &mut VerificationReport) -> Option<String> {
        let manifest_bytes = match self.reader.read(&run_entry.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                report.fail(Some(run_entry.run_id), "manifest_readable", err.to_string());
                return None;
            }
        };
        report.pass();

        let manifest_sha256 = hash_bytes(DEFAULT_HASH_ALGORITHM, &manifest_bytes).value;
        if manifest_sha256 == run_entry.sha256 {
            report.pass();
        } else {
            report.fail(Some(run_entry.run_id), "manifest_hash_matches_index", "recomputed manifest hash does not match PACK_INDEX entry");
        }

        let manifest: RunManifest = match serde_json::from_slice(&manifest_bytes) {
            Ok(manifest) => {
                report.pass();
                manifest
            }
            Err(err) => {
                report.fail(Some(run_entry.run_id), "manifest_parseable", err.to_string());
                return Some(manifest_sha256);
            }
        };

        self.verify_manifest_signature(&manifest, report);
        self.verify_artifacts(&manifest, report);
        self.verify_cross_artifact_checks(&manifest, report);

        Some(manifest_sha256)
    }

    /// Step 1 and 2: locates the public key, checks `keyId` against its
    /// fingerprint, and verifies the manifest's Ed25519 signature against the
    /// canonical form with `manifestSignature` removed.
    fn verify_manifest_signature(&self, manifest: &RunManifest, report: &mut VerificationReport) {
        let Some(signature) = &manifest.manifest_signature else {
            report.fail(Some(manifest.run_id), "manifest_signature_present", "manifest carries no signature block");
            return;
        };
        report.pass();

        let public_key_bytes = match self.reader.read(&signature.public_key_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                report.fail(Some(manifest.run_id), "public_key_readable", err.to_string());
                return;
            }
        };
        report.pass();

        let fingerprint: String = hash_bytes(DEFAULT_HASH_ALGORITHM, &public_key_bytes).value.chars().take(16).collect();
        let expected_key_id = format!("{KEY_ID_PREFIX}:{fingerprint}");
        if signature.key_id == expected_key_id {
            report.pass();
        } else {
            report.fail(Some(manifest.run_id), "key_id_matches_fingerprint", format!("keyId {} does not match derived fingerprint {expected_key_id}", signature.key_id));
        }

        let unsigned = manifest.without_signature();
        let canonical = match canonicalize(&unsigned) {
            Ok(bytes) => bytes,
            Err(err) => {
                report.fail(Some(manifest.run_id), "manifest_canonicalizable", err.to_string());
                return;
            }
        };
        report.pass();

        match Ed25519Signer::verify(&public_key_bytes, &canonical, &signature.value) {
            Ok(true) => report.pass(),
            Ok(false) => report.fail(Some(manifest.run_id), "manifest_signature_valid", "ed25519 signature did not verify"),
            Err(err) => report.fail(Some(manifest.run_id), "manifest_signature_valid", err.to_string()),
        }
    }

    /// Step 4: for each listed artifact, checks file size and SHA-256.
    fn verify_artifacts(&self, manifest: &RunManifest, report: &mut VerificationReport) {
        for artifact in &manifest.artifacts {
            let bytes = match self.reader.read(&artifact.path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    report.fail(Some(manifest.run_id), "artifact_readable", format!("{}: {err}", artifact.path));
                    continue;
                }
            };
            report.pass();

            if bytes.len() as u64 == artifact.bytes {
                report.pass();
            } else {
                report.fail(Some(manifest.run_id), "artifact_size_matches", format!("{} size mismatch", artifact.path));
            }

            let sha256 = hash_bytes(DEFAULT_HASH_ALGORITHM, &bytes).value;
            if sha256 == artifact.sha256 {
                report.pass();
            } else {
                report.fail(Some(manifest.run_id), "artifact_hash_matches", format!("{} hash mismatch", artifact.path));
            }
        }
    }

    /// Step 5 (if `verification/fc-binding.json` is present) and step 6:
    /// tenant consistency across the manifest and its plan/ledger/receipt/
    /// summary artifacts, plus the FC binding cross-hash checks.
    fn verify_cross_artifact_checks(&self, manifest: &RunManifest, report: &mut VerificationReport) {
        if manifest.tenant_id.is_blank() {
            report.fail(Some(manifest.run_id), "manifest_tenant_present", "manifest tenantId is blank");
        } else {
            report.pass();
        }
        if manifest.scope.tenant_id == manifest.tenant_id {
            report.pass();
        } else {
            report.fail(Some(manifest.run_id), "scope_tenant_matches_manifest", "scope.tenantId does not match manifest.tenantId");
        }

        let plan = self.read_typed_artifact::<PublicationPlan>(manifest, "publication-plan.json");
        let ledger = self.read_typed_artifact::<ProofLedger>(manifest, "proof-ledger.json");
        let receipt = self.read_typed_artifact::<JudgeAdvisoryReceipt>(manifest, "judge-advisory-receipt.json");
        let summary = self.read_typed_artifact::<ApproverSummary>(manifest, "approver-summary.json");

        match &plan {
            Some((_, plan)) if plan.tenant_id == manifest.tenant_id => report.pass(),
            Some(_) => report.fail(Some(manifest.run_id), "plan_tenant_matches_manifest", "publication-plan.json tenantId does not match manifest"),
            None => report.fail(Some(manifest.run_id), "plan_readable_for_tenant_check", "publication-plan.json missing or unparseable"),
        }
        match &ledger {
            Some((_, ledger)) if ledger.tenant_id == manifest.tenant_id => report.pass(),
            Some(_) => report.fail(Some(manifest.run_id), "ledger_tenant_matches_manifest", "proof-ledger.json tenantId does not match manifest"),
            None => report.fail(Some(manifest.run_id), "ledger_readable_for_tenant_check", "proof-ledger.json missing or unparseable"),
        }
        match &summary {
            Some((_, summary)) if summary.tenant_id == manifest.tenant_id => report.pass(),
            Some(_) => report.fail(Some(manifest.run_id), "summary_tenant_matches_manifest", "approver-summary.json tenantId does not match manifest"),
            None => report.fail(Some(manifest.run_id), "summary_readable_for_tenant_check", "approver-summary.json missing or unparseable"),
        }
        if let Some((_, receipt)) = &receipt {
            if receipt.tenant_id == manifest.tenant_id {
                report.pass();
            } else {
                report.fail(Some(manifest.run_id), "receipt_tenant_matches_manifest", "judge-advisory-receipt.json tenantId does not match manifest");
            }
        }

        let Ok(binding_bytes) = self.reader.read(&format!("runs/{}/verification/fc-binding.json", manifest.run_id)) else {
            return;
        };
        report.pass();
        let binding: FcBindingRecord = match serde_json::from_slice(&binding_bytes) {
            Ok(binding) => {
                report.pass();
                binding
            }
            Err(err) => {
                report.fail(Some(manifest.run_id), "fc_binding_parseable", err.to_string());
                return;
            }
        };

        self.verify_fc_binding_checks(manifest, &binding, plan.as_ref(), ledger.as_ref(), receipt.as_ref(), report);
    }

    /// Re-runs every check named in `binding.checks` against the plan,
    /// ledger, and advisory receipt already read for this run.
    #[allow(clippy::too_many_arguments, reason = "each argument is one independently-optional artifact the checks cross-reference")]
    fn verify_fc_binding_checks(
        &self,
        manifest: &RunManifest,
        binding: &FcBindingRecord,
        plan: Option<&(Vec<u8>, PublicationPlan)>,
        ledger: Option<&(Vec<u8>, ProofLedger)>,
        receipt: Option<&(Vec<u8>, JudgeAdvisoryReceipt)>,
        report: &mut VerificationReport,
    ) {
        let run_id = Some(manifest.run_id);
        for check in &binding.checks {
            match check.as_str() {
                "receipt_present" => {
                    if receipt.is_some() {
                        report.pass();
                    } else {
                        report.fail(run_id, "receipt_present", "fc-binding.json lists receipt_present but no advisory receipt artifact exists");
                    }
                }
                "receipt_issuer_matches_fc" => match receipt {
                    Some((_, receipt)) if receipt.issuer.id == binding.fc_issuer_id => report.pass(),
                    Some(_) => report.fail(run_id, "receipt_issuer_matches_fc", "receipt issuer does not match fc-binding.json's configured issuer"),
                    None => report.fail(run_id, "receipt_issuer_matches_fc", "no receipt to check issuer against"),
                },
                "receipt_run_id_matches_manifest" => match receipt {
                    Some((_, receipt)) if receipt.run_id == manifest.run_id => report.pass(),
                    Some(_) => report.fail(run_id, "receipt_run_id_matches_manifest", "receipt runId does not match manifest runId"),
                    None => report.fail(run_id, "receipt_run_id_matches_manifest", "no receipt to check runId against"),
                },
                "receipt_plan_digest_matches" => match (receipt, plan) {
                    (Some((_, receipt)), Some((plan_bytes, _))) => {
                        let expected = hash_bytes(DEFAULT_HASH_ALGORITHM, plan_bytes).value;
                        if receipt.subject.subject_digests.plan_sha256 == expected {
                            report.pass();
                        } else {
                            report.fail(run_id, "receipt_plan_digest_matches", "receipt's planSha256 does not match publication-plan.json");
                        }
                    }
                    _ => report.fail(run_id, "receipt_plan_digest_matches", "missing receipt or plan for digest check"),
                },
                "receipt_ledger_digest_matches" => match (receipt, ledger) {
                    (Some((_, receipt)), Some((_, ledger))) => match canonicalize(&ledger.without_receipt_fields()) {
                        Ok(canonical) => {
                            let expected = hash_bytes(DEFAULT_HASH_ALGORITHM, &canonical).value;
                            if receipt.subject.subject_digests.ledger_sha256 == expected {
                                report.pass();
                            } else {
                                report.fail(run_id, "receipt_ledger_digest_matches", "receipt's ledgerSha256 does not match proof-ledger.json");
                            }
                        }
                        Err(err) => report.fail(run_id, "receipt_ledger_digest_matches", err.to_string()),
                    },
                    _ => report.fail(run_id, "receipt_ledger_digest_matches", "missing receipt or ledger for digest check"),
                },
                "receipt_signature_valid" => match (receipt, self.fc_signer) {
                    (Some((_, receipt)), Some(signer)) => match canonicalize(&receipt.without_signature()) {
                        Ok(canonical) => {
                            if signer.verify(&canonical, &receipt.signature.value) {
                                report.pass();
                            } else {
                                report.fail(run_id, "receipt_signature_valid", "receipt HMAC signature did not verify");
                            }
                        }
                        Err(err) => report.fail(run_id, "receipt_signature_valid", err.to_string()),
                    },
                    (None, _) => report.fail(run_id, "receipt_signature_valid", "no receipt to verify signature of"),
                    (Some(_), None) => {}
                },
                "ledger_receipt_id_matches" => match (ledger, receipt) {
                    (Some((_, ledger)), Some((_, receipt))) => {
                        if ledger.receipt_id.as_deref() == Some(receipt.id.as_str()) {
                            report.pass();
                        } else {
                            report.fail(run_id, "ledger_receipt_id_matches", "ledger.receiptId does not match receipt.id");
                        }
                    }
                    _ => report.fail(run_id, "ledger_receipt_id_matches", "missing ledger or receipt for back-reference check"),
                },
                "ledger_receipt_digest_matches" => match (ledger, receipt) {
                    (Some((_, ledger)), Some((_, receipt))) => {
                        if ledger.receipt_digest.as_deref() == Some(receipt.digests.receipt_sha256.as_str()) {
                            report.pass();
                        } else {
                            report.fail(run_id, "ledger_receipt_digest_matches", "ledger.receiptDigest does not match receipt.digests.receiptSha256");
                        }
                    }
                    _ => report.fail(run_id, "ledger_receipt_digest_matches", "missing ledger or receipt for digest back-reference check"),
                },
                "tenant_consistency" => {
                    let consistent = plan.is_some_and(|(_, plan)| plan.tenant_id == manifest.tenant_id)
                        && ledger.is_some_and(|(_, ledger)| ledger.tenant_id == manifest.tenant_id)
                        && receipt.is_none_or(|(_, receipt)| receipt.tenant_id == manifest.tenant_id);
                    if consistent {
                        report.pass();
                    } else {
                        report.fail(run_id, "tenant_consistency", "plan/ledger/receipt tenantIds are not all consistent with the manifest");
                    }
                }
                other => report.fail(run_id, "fc_binding_check_recognized", format!("unrecognized fc-binding check name: {other}")),
            }
        }
    }

    /// Reads and deserializes one named artifact from a manifest's artifact
    /// list, returning its raw bytes alongside the parsed value. Returns
    /// `None` when the artifact is not listed, unreadable, or unparseable —
    /// callers decide whether that absence is itself a failure.
    fn read_typed_artifact<T: DeserializeOwned>(&self, manifest: &RunManifest, name: &str) -> Option<(Vec<u8>, T)> {
        let record: &ArtifactRecord = manifest.artifacts.iter().find(|artifact| artifact.name == name)?;
        let bytes = self.reader.read(&record.path).ok()?;
        let value = serde_json::from_slice(&bytes).ok()?;
        Some((bytes, value))
    }

    /// Recomputes `packSha256` from the manifest hashes observed in the same
    /// order as `PACK_INDEX.runs`, so tampering that reorders the array
    /// without touching any manifest is still caught.
    fn verify_pack_seal(&self, index: &PackIndex, manifest_hashes: &[String], report: &mut VerificationReport) {
        if manifest_hashes.len() != index.runs.len() {
            report.fail(None, "pack_seal_all_runs_readable", "one or more run manifests could not be read; pack seal cannot be recomputed");
            return;
        }
        let concatenated: String = manifest_hashes.iter().map(String::as_str).collect();
        let recomputed = hash_bytes(DEFAULT_HASH_ALGORITHM, concatenated.as_bytes()).value;
        if recomputed == index.pack_sha256 {
            report.pass();
        } else {
            report.fail(None, "pack_seal_matches", "recomputed packSha256 does not match PACK_INDEX.packSha256");
        }
    }

    /// Single-tenant pack rule: `PACK_INDEX.tenantId` non-empty and equal to
    /// every run's `tenantId`.
    fn verify_single_tenant(&self, index: &PackIndex, report: &mut VerificationReport) {
        if !index.has_single_tenant() {
            report.fail(None, "pack_tenant_present", "PACK_INDEX.tenantId is blank");
            return;
        }
        report.pass();

        for run_entry in &index.runs {
            let Ok(manifest_bytes) = self.reader.read(&run_entry.path) else {
                continue;
            };
            let Ok(manifest) = serde_json::from_slice::<RunManifest>(&manifest_bytes) else {
                continue;
            };
            if manifest.tenant_id == index.tenant_id {
                report.pass();
            } else {
                report.fail(Some(run_entry.run_id), "pack_tenant_matches_run", "run tenantId does not match PACK_INDEX.tenantId");
            }
        }
    }
}
