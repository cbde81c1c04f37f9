// crates/gatekeeper-core/src/core/packet.rs
// ============================================================================
// Module: Gatekeeper Publish Packet
// Description: Input record to the gate state machine.
// Purpose: Carry an artifact's identity, destinations, and payload reference.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A `PublishPacket` is the sole input to the gate. It is immutable except
//! for the `governance` field, which the gate populates on success.
//! Structural invariants are checked by [`PublishPacket::validate`]; the gate
//! calls this at its Precheck stage and maps each violation to a stable
//! `denialCode`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActorId;
use crate::core::identifiers::ArtifactId;
use crate::core::identifiers::CorrelationId;
use crate::core::identifiers::DestinationId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Payload Reference
// ============================================================================

/// Where the artifact payload actually lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadKind {
    /// A local file path.
    File,
    /// A path relative to a repository root.
    RepoPath,
    /// A reference into an artifact store.
    ArtifactStore,
}

/// Pointer to the artifact payload.
///
/// # Invariants
/// - `path` must be relative, must not start with a path separator, must not
///   contain `..` segments, and no segment may contain `:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadRef {
    /// Where the payload lives.
    pub kind: PayloadKind,
    /// Relative, traversal-safe path to the payload.
    pub path: String,
    /// Optional MIME content type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Optional pre-computed SHA-256 of the payload bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl PayloadRef {
    /// Returns `true` when `path` is relative, non-rooted, free of `..`
    /// segments, and free of `:` within any segment.
    #[must_use]
    pub fn has_safe_path(&self) -> bool {
        if self.path.is_empty() || self.path.starts_with('/') || self.path.starts_with('\\') {
            return false;
        }
        self.path.split(['/', '\\']).all(|segment| segment != ".." && !segment.contains(':'))
    }
}

// ============================================================================
// SECTION: Governance Evidence (populated on success)
// ============================================================================

/// Governance evidence attached to a packet once the gate succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceEvidence {
    /// Receipt identifier minted by the Governance SDK.
    pub receipt_id: String,
    /// Decision outcome reported by the Governance SDK.
    pub outcome: String,
    /// Decision timestamp.
    pub decided_at_utc: Timestamp,
    /// Where the decision receipt was written, if materialized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_path: Option<String>,
    /// Where the evidence pack was written, if materialized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_pack_path: Option<String>,
    /// Human-readable verification summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_summary: Option<String>,
}

// ============================================================================
// SECTION: Publish Packet
// ============================================================================

/// The input to the gate: an artifact awaiting a publication decision.
///
/// # Invariants
/// - `artifact_id`, `tenant_id`, `correlation_id`, `actor_id` are non-empty.
/// - `destinations` is non-empty; each destination is whitespace/control-clean.
/// - `payload_ref.path` is relative and traversal-safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPacket {
    /// Artifact identifier.
    pub artifact_id: ArtifactId,
    /// Free-form artifact type label.
    pub artifact_type: String,
    /// Packet creation timestamp.
    pub created_at_utc: Timestamp,
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Correlation identifier propagated end to end.
    pub correlation_id: CorrelationId,
    /// Actor identifier for the submitting caller.
    pub actor_id: ActorId,
    /// Ordered source references (free-form, e.g. commit SHAs or URIs).
    pub source_refs: Vec<String>,
    /// Pointer to the artifact payload.
    pub payload_ref: PayloadRef,
    /// Ordered destination identifiers this packet targets.
    pub destinations: Vec<DestinationId>,
    /// Governance evidence, present only once the gate has succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub governance: Option<GovernanceEvidence>,
}

/// A single structural violation found during [`PublishPacket::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketInvariantViolation {
    /// `artifactId` was empty.
    ArtifactIdMissing,
    /// `tenantId` was empty.
    TenantIdMissing,
    /// `correlationId` was empty.
    CorrelationIdMissing,
    /// `actorId` was empty.
    ActorIdMissing,
    /// `destinations` was empty.
    DestinationsEmpty,
    /// A destination was empty or contained whitespace/control characters.
    DestinationInvalid,
    /// `payloadRef.path` was not a safe relative path.
    PayloadRefInvalid,
}

impl PublishPacket {
    /// Checks the §3 structural invariants, returning every violation found
    /// (not just the first) in a stable, deterministic order.
    #[must_use]
    pub fn validate(&self) -> Vec<PacketInvariantViolation> {
        let mut violations = Vec::new();
        if self.artifact_id.is_blank() {
            violations.push(PacketInvariantViolation::ArtifactIdMissing);
        }
        if self.tenant_id.is_blank() {
            violations.push(PacketInvariantViolation::TenantIdMissing);
        }
        if self.correlation_id.is_blank() {
            violations.push(PacketInvariantViolation::CorrelationIdMissing);
        }
        if self.actor_id.is_blank() {
            violations.push(PacketInvariantViolation::ActorIdMissing);
        }
        if self.destinations.is_empty() {
            violations.push(PacketInvariantViolation::DestinationsEmpty);
        } else if self.destinations.iter().any(|dest| !is_clean_destination(dest.as_str())) {
            violations.push(PacketInvariantViolation::DestinationInvalid);
        }
        if !self.payload_ref.has_safe_path() {
            violations.push(PacketInvariantViolation::PayloadRefInvalid);
        }
        violations
    }

    /// Returns a copy of this packet with `governance` cleared, as used for
    /// computing `packetHashSha256` at the gate's Hash stage.
    #[must_use]
    pub fn without_governance(&self) -> Self {
        Self {
            governance: None,
            ..self.clone()
        }
    }
}

/// Returns `true` when `destination` is non-empty and free of whitespace and
/// control characters.
fn is_clean_destination(destination: &str) -> bool {
    !destination.is_empty() && destination.chars().all(|ch| !ch.is_whitespace() && !ch.is_control())
}
