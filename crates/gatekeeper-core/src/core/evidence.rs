// crates/gatekeeper-core/src/core/evidence.rs
// ============================================================================
// Module: Gatekeeper Evidence Record
// Description: The record type held by the Governance SDK.
// Purpose: Model the downstream evidence store's content-addressed records.
// Dependencies: crate::core::{hashing, time}, serde
// ============================================================================

//! ## Overview
//! `EvidenceRecord` is owned by the Governance SDK, not by a run. The core
//! only ever sees the `{evidenceId, digest, createdAt}` triple a create call
//! returns and the full record a download call returns; this type models
//! both paths through one immutable record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::hash_bytes;
use crate::core::identifiers::CorrelationId;
use crate::core::identifiers::EvidenceId;
use crate::core::identifiers::ReceiptId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Evidence Record
// ============================================================================

/// An immutable evidence record minted by the Governance SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    /// Evidence identifier minted by the SDK.
    pub evidence_id: EvidenceId,
    /// The decision receipt this evidence is attached to.
    pub receipt_id: ReceiptId,
    /// Canonical hash supplied by the caller, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_hash: Option<String>,
    /// Raw content bytes (base64 on the wire; kept as bytes in memory).
    #[serde(with = "content_as_base64")]
    pub content: Vec<u8>,
    /// `sha256(content)`, computed at creation and never recomputed.
    pub digest: String,
    /// When this record was created.
    pub created_at: Timestamp,
    /// Tenant identifier, if supplied at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
    /// Correlation identifier, if supplied at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    /// Free-form phase label, e.g. `"decision"` or `"evidence-pack"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// Error raised downloading an evidence record.
#[derive(Debug, Error)]
pub enum EvidenceDownloadError {
    /// The requested evidence id does not exist.
    #[error("evidence record {0} not found")]
    NotFound(String),
    /// The stored content's digest did not match the expected digest.
    #[error("evidence record {0} failed digest verification on download")]
    DigestMismatch(String),
}

impl EvidenceRecord {
    /// Creates a new evidence record, computing its digest from `content`.
    #[must_use]
    pub fn create(
        evidence_id: EvidenceId,
        receipt_id: ReceiptId,
        canonical_hash: Option<String>,
        content: Vec<u8>,
        tenant_id: Option<TenantId>,
        correlation_id: Option<CorrelationId>,
        phase: Option<String>,
    ) -> Self {
        let digest = hash_bytes(HashAlgorithm::Sha256, &content).value;
        Self {
            evidence_id,
            receipt_id,
            canonical_hash,
            content,
            digest,
            created_at: Timestamp::now(),
            tenant_id,
            correlation_id,
            phase,
        }
    }

    /// Returns this record's content after re-verifying its digest,
    /// optionally against a caller-supplied expected digest.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceDownloadError::DigestMismatch`] when the stored
    /// content no longer hashes to `self.digest`, or when `expected_digest`
    /// is supplied and does not match.
    pub fn download(&self, expected_digest: Option<&str>) -> Result<&[u8], EvidenceDownloadError> {
        let recomputed = hash_bytes(HashAlgorithm::Sha256, &self.content).value;
        if recomputed != self.digest {
            return Err(EvidenceDownloadError::DigestMismatch(self.evidence_id.to_string()));
        }
        if let Some(expected) = expected_digest {
            if expected != self.digest {
                return Err(EvidenceDownloadError::DigestMismatch(self.evidence_id.to_string()));
            }
        }
        Ok(&self.content)
    }
}

mod content_as_base64 {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
    use serde::Deserialize as _;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        BASE64_STANDARD.decode(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_succeeds_on_matching_digest() {
        let record = EvidenceRecord::create(
            EvidenceId::new("ev-1"),
            ReceiptId::new("rc-1"),
            None,
            b"hello".to_vec(),
            None,
            None,
            None,
        );
        assert_eq!(record.download(Some(&record.digest.clone())).expect("download"), b"hello");
    }

    #[test]
    fn download_fails_closed_on_digest_mismatch() {
        let mut record = EvidenceRecord::create(
            EvidenceId::new("ev-1"),
            ReceiptId::new("rc-1"),
            None,
            b"hello".to_vec(),
            None,
            None,
            None,
        );
        record.digest = "tampered".to_owned();
        assert!(record.download(None).is_err());
    }
}
