// crates/gatekeeper-core/src/core/gate_result.rs
// ============================================================================
// Module: Gatekeeper Gate Result
// Description: Outcome record produced by the gate state machine.
// Purpose: Carry a precise failure stage and denial code on every path.
// Dependencies: crate::core::packet, serde
// ============================================================================

//! ## Overview
//! `GateResult` is the gate's sole output type. It is intentionally a single
//! flat record rather than a success/failure enum so every caller (CLI, HTTP,
//! tests) can inspect `allowed` plus the optional diagnostic fields without
//! matching on a sum type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::packet::GovernanceEvidence;
use crate::core::packet::PublishPacket;

// ============================================================================
// SECTION: Failure Stage
// ============================================================================

/// The stage at which a gate run terminated, when it did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureStage {
    /// Packet shape or policy precondition violation.
    Precheck,
    /// `packetHashSha256` computation failed.
    Hash,
    /// Governance decision denied or errored.
    Decision,
    /// Bound execution step failed.
    Execution,
    /// Audit evidence could not be sealed.
    EvidencePack,
    /// Evidence verification failed.
    Verify,
    /// An unhandled error occurred outside the named stages.
    Exception,
}

// ============================================================================
// SECTION: Denial Codes (§7 error taxonomy)
// ============================================================================

/// Stable, machine-readable denial codes surfaced on `GateResult.denialCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs, reason = "each variant's name is the stable wire string it serializes to")]
pub enum DenialCode {
    PacketNull,
    ArtifactIdMissing,
    TenantIdMissing,
    CorrelationIdMissing,
    DestinationsEmpty,
    DestinationInvalid,
    PayloadRefMissing,
    PayloadRefInvalid,
    TenantMismatch,
    ActorMismatch,
    DestinationNotAllowed,
    DecisionFailed,
    DecisionNotApproved,
    ExecutionParamsInvalid,
    ExecutionFailed,
    EvidencePackFailed,
    SdkGapAuditWrite,
    VerifyFailed,
    VerifyException,
    GateException,
}

impl DenialCode {
    /// Returns the stable wire string for this code, as surfaced in §7.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PacketNull => "PACKET_NULL",
            Self::ArtifactIdMissing => "ARTIFACT_ID_MISSING",
            Self::TenantIdMissing => "TENANT_ID_MISSING",
            Self::CorrelationIdMissing => "CORRELATION_ID_MISSING",
            Self::DestinationsEmpty => "DESTINATIONS_EMPTY",
            Self::DestinationInvalid => "DESTINATION_INVALID",
            Self::PayloadRefMissing => "PAYLOAD_REF_MISSING",
            Self::PayloadRefInvalid => "PAYLOAD_REF_INVALID",
            Self::TenantMismatch => "TENANT_MISMATCH",
            Self::ActorMismatch => "ACTOR_MISMATCH",
            Self::DestinationNotAllowed => "DESTINATION_NOT_ALLOWED",
            Self::DecisionFailed => "DECISION_FAILED",
            Self::DecisionNotApproved => "DECISION_NOT_APPROVED",
            Self::ExecutionParamsInvalid => "EXECUTION_PARAMS_INVALID",
            Self::ExecutionFailed => "EXECUTION_FAILED",
            Self::EvidencePackFailed => "EVIDENCE_PACK_FAILED",
            Self::SdkGapAuditWrite => "SDK_GAP_AUDIT_WRITE",
            Self::VerifyFailed => "VERIFY_FAILED",
            Self::VerifyException => "VERIFY_EXCEPTION",
            Self::GateException => "GATE_EXCEPTION",
        }
    }

    /// Returns the failure stage this code is mapped to in §7.
    #[must_use]
    pub const fn failure_stage(self) -> FailureStage {
        match self {
            Self::PacketNull
            | Self::ArtifactIdMissing
            | Self::TenantIdMissing
            | Self::CorrelationIdMissing
            | Self::DestinationsEmpty
            | Self::DestinationInvalid
            | Self::PayloadRefMissing
            | Self::PayloadRefInvalid
            | Self::TenantMismatch
            | Self::ActorMismatch
            | Self::DestinationNotAllowed => FailureStage::Precheck,
            Self::DecisionFailed | Self::DecisionNotApproved => FailureStage::Decision,
            Self::ExecutionParamsInvalid | Self::ExecutionFailed => FailureStage::Execution,
            Self::EvidencePackFailed | Self::SdkGapAuditWrite => FailureStage::EvidencePack,
            Self::VerifyFailed | Self::VerifyException => FailureStage::Verify,
            Self::GateException => FailureStage::Exception,
        }
    }
}

impl std::fmt::Display for DenialCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Gate Result
// ============================================================================

/// Outcome of a single gate run.
///
/// # Invariants
/// - `allowed` iff `failure_stage` is `None` and `denial_code` is `None` and
///   `governance` is `Some`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateResult {
    /// Whether the publication is authorized.
    pub allowed: bool,
    /// Stable denial code, present only when `allowed = false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial_code: Option<String>,
    /// Human-readable denial explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial_message: Option<String>,
    /// The stage at which the run terminated, when it did not succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_stage: Option<FailureStage>,
    /// `packetHashSha256`, present once the Hash stage has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_hash_sha256: Option<String>,
    /// The (possibly governance-augmented) packet.
    pub packet: PublishPacket,
    /// Governance evidence, present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub governance: Option<GovernanceEvidence>,
}

impl GateResult {
    /// Builds a successful result.
    #[must_use]
    pub fn allow(packet: PublishPacket, packet_hash_sha256: String, governance: GovernanceEvidence) -> Self {
        Self {
            allowed: true,
            denial_code: None,
            denial_message: None,
            failure_stage: None,
            packet_hash_sha256: Some(packet_hash_sha256),
            packet,
            governance: Some(governance),
        }
    }

    /// Builds a denied result carrying a stable [`DenialCode`].
    #[must_use]
    pub fn deny(packet: PublishPacket, code: DenialCode, message: impl Into<String>, packet_hash_sha256: Option<String>) -> Self {
        Self {
            allowed: false,
            denial_code: Some(code.as_str().to_owned()),
            denial_message: Some(message.into()),
            failure_stage: Some(code.failure_stage()),
            packet_hash_sha256,
            packet,
            governance: None,
        }
    }

    /// Returns `true` when this result upholds the invariant documented on
    /// [`GateResult`] (used in tests and as a defensive check before
    /// returning a result from the gate).
    #[must_use]
    pub fn upholds_allowed_invariant(&self) -> bool {
        self.allowed == (self.failure_stage.is_none() && self.denial_code.is_none() && self.governance.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identifiers::ActorId;
    use crate::core::identifiers::ArtifactId;
    use crate::core::identifiers::CorrelationId;
    use crate::core::identifiers::DestinationId;
    use crate::core::identifiers::TenantId;
    use crate::core::packet::PayloadKind;
    use crate::core::packet::PayloadRef;
    use crate::core::time::Timestamp;

    fn sample_packet() -> PublishPacket {
        PublishPacket {
            artifact_id: ArtifactId::new("artifact-1"),
            artifact_type: "library".to_owned(),
            created_at_utc: Timestamp::now(),
            tenant_id: TenantId::new("keon-public"),
            correlation_id: CorrelationId::new("corr-1"),
            actor_id: ActorId::new("actor-1"),
            source_refs: Vec::new(),
            payload_ref: PayloadRef {
                kind: PayloadKind::RepoPath,
                path: "dist/artifact.tar.gz".to_owned(),
                content_type: None,
                sha256: None,
            },
            destinations: vec![DestinationId::new("registry-a")],
            governance: None,
        }
    }

    #[test]
    fn deny_upholds_invariant() {
        let result = GateResult::deny(sample_packet(), DenialCode::TenantMismatch, "tenant mismatch", None);
        assert!(result.upholds_allowed_invariant());
        assert_eq!(result.denial_code.as_deref(), Some("TENANT_MISMATCH"));
        assert_eq!(result.failure_stage, Some(FailureStage::Precheck));
    }

    #[test]
    fn denial_code_maps_to_documented_stage() {
        assert_eq!(DenialCode::DecisionNotApproved.failure_stage(), FailureStage::Decision);
        assert_eq!(DenialCode::VerifyException.failure_stage(), FailureStage::Verify);
    }
}
