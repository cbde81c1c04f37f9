// crates/gatekeeper-core/src/core/proofpack_model.rs
// ============================================================================
// Module: Gatekeeper Proof Pack Data Model
// Description: RunManifest and PackIndex record types.
// Purpose: Describe the on-disk, sealed shape of a Proof Pack.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! `RunManifest` and `PackIndex` are the two sealed index types a Proof Pack
//! carries. Both are built unsigned/unsealed first, canonicalized, then
//! signed or hashed — the canonical form for manifest signing always
//! excludes `manifestSignature`, enforced by [`RunManifest::unsigned`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Run Manifest
// ============================================================================

/// One artifact file recorded in a run manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    /// Logical artifact name, e.g. `"publication-plan.json"`.
    pub name: String,
    /// Path relative to the run directory.
    pub path: String,
    /// Lowercase-hex SHA-256 of the file's bytes.
    pub sha256: String,
    /// File size in bytes.
    pub bytes: u64,
}

/// The scope this run's manifest is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestScope {
    /// Tenant identifier.
    pub tenant_id: TenantId,
}

/// The Ed25519 signature sealing a run manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSignature {
    /// Signature algorithm, always `"ed25519"`.
    pub algorithm: String,
    /// The signer's `keyId` (protocol prefix plus fingerprint).
    pub key_id: String,
    /// Path to the public key shipped alongside the pack.
    pub public_key_path: String,
    /// Base64-encoded signature value.
    pub value: String,
}

/// Per-run manifest for a sealed Proof Pack.
///
/// # Invariants
/// - The canonical form used for signing excludes `manifest_signature`;
///   verification recomputes it with the field removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    /// The run this manifest describes.
    pub run_id: RunId,
    /// Free-form scenario label for this run.
    pub scenario: String,
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Manifest scope.
    pub scope: ManifestScope,
    /// Ordered artifact records.
    pub artifacts: Vec<ArtifactRecord>,
    /// The sealing signature, present only once signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_signature: Option<ManifestSignature>,
}

impl RunManifest {
    /// Builds an unsigned manifest.
    #[must_use]
    pub fn unsigned(run_id: RunId, scenario: String, tenant_id: TenantId, artifacts: Vec<ArtifactRecord>) -> Self {
        Self {
            run_id,
            scenario,
            tenant_id: tenant_id.clone(),
            scope: ManifestScope {
                tenant_id,
            },
            artifacts,
            manifest_signature: None,
        }
    }

    /// Returns a copy of this manifest with `manifest_signature` cleared, as
    /// used for the canonical form that is signed and later re-verified.
    #[must_use]
    pub fn without_signature(&self) -> Self {
        Self {
            manifest_signature: None,
            ..self.clone()
        }
    }
}

// ============================================================================
// SECTION: Pack Index
// ============================================================================

/// One run's entry in a pack's top-level index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackIndexRun {
    /// The run identifier.
    pub run_id: RunId,
    /// Free-form scenario label.
    pub scenario: String,
    /// Path to this run's manifest, relative to the pack root.
    pub path: String,
    /// Lowercase-hex SHA-256 of the on-disk manifest bytes.
    pub sha256: String,
}

/// The pack-level seal binding every run manifest hash into one value.
///
/// # Invariants
/// - All runs in a pack share a single `tenant_id`, equal to the pack's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackIndex {
    /// Pack identifier.
    pub pack_id: String,
    /// When this pack was sealed.
    pub created_at: Timestamp,
    /// Tenant identifier shared by every run in the pack.
    pub tenant_id: TenantId,
    /// Ordered run entries.
    pub runs: Vec<PackIndexRun>,
    /// `sha256(utf8(concat(manifestHash_i)))`, concatenated in the same
    /// order as `runs` below. Reordering `runs` without touching any
    /// manifest therefore still changes the recomputed value.
    pub pack_sha256: String,
}

impl PackIndex {
    /// Returns `true` when the pack-level tenant id is present. Per-run
    /// tenant consistency is checked against each run's manifest by the
    /// verifier, since `PackIndexRun` does not itself carry a `tenantId`.
    #[must_use]
    pub fn has_single_tenant(&self) -> bool {
        !self.tenant_id.is_blank()
    }
}

// ============================================================================
// SECTION: FC Binding Record
// ============================================================================

/// Names of the cross-hash checks an [`FcBindingRecord`] attests were
/// performed at build time, and that a verifier must independently re-run.
pub const FC_BINDING_CHECKS: &[&str] = &[
    "receipt_present",
    "receipt_issuer_matches_fc",
    "receipt_run_id_matches_manifest",
    "receipt_plan_digest_matches",
    "receipt_ledger_digest_matches",
    "receipt_signature_valid",
    "ledger_receipt_id_matches",
    "ledger_receipt_digest_matches",
    "tenant_consistency",
];

/// Optional per-run record binding the advisory receipt to its plan, ledger,
/// and FC issuer, written under `runs/<runId>/verification/fc-binding.json`.
///
/// # Invariants
/// - Presence of this file is itself the trigger for a verifier to run the
///   cross-hash checks it lists; its absence is not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FcBindingRecord {
    /// The FC issuer id the receipt's `issuer.id` is expected to equal.
    pub fc_issuer_id: String,
    /// The cross-hash checks a verifier must re-run, from [`FC_BINDING_CHECKS`].
    pub checks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_signature_round_trips_rest_of_manifest() {
        let manifest = RunManifest::unsigned(RunId::generate(), "hygiene-sweep".to_owned(), TenantId::new("t"), Vec::new());
        let signed = RunManifest {
            manifest_signature: Some(ManifestSignature {
                algorithm: "ed25519".to_owned(),
                key_id: "key-1".to_owned(),
                public_key_path: "keys/proofpack_signing_public.ed25519".to_owned(),
                value: "base64sig".to_owned(),
            }),
            ..manifest.clone()
        };
        assert_eq!(signed.without_signature(), manifest);
    }
}
