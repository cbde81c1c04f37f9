// crates/gatekeeper-core/src/core/advisory.rs
// ============================================================================
// Module: Gatekeeper Judge Advisory Receipt
// Description: The signed receipt binding a run's plan and ledger.
// Purpose: Carry dry-run advisory and prod enforceable signed attestations.
// Dependencies: crate::core::{hashing, identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A `JudgeAdvisoryReceipt` is "advisory" in dry-run (`enforceable = false`)
//! and would be enforceable in prod. This repo's pipeline only ever mints the
//! advisory form; the `enforceable` field exists so the type matches the
//! shape a prod-mode receipt would need without a second, parallel type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Issuer / Subject / Digests / Signature
// ============================================================================

/// Identifies the service that issued an advisory receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    /// Issuer identifier, e.g. the FC Signer's `keyId`.
    pub id: String,
    /// The issuing endpoint, for audit trail purposes.
    pub endpoint: String,
}

/// The canonical hashes of the artifacts this receipt is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDigests {
    /// `hash(canonicalize(plan))`.
    pub plan_sha256: String,
    /// `hash(canonicalize(ledger-without-receipt-fields))`.
    pub ledger_sha256: String,
}

/// What this receipt attests to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Tenant identifier this receipt is scoped to.
    pub tenant_id: TenantId,
    /// Subject digests.
    pub subject_digests: SubjectDigests,
}

/// Receipt-level digests, distinct from the subject's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDigests {
    /// `hash(canonicalize(receipt-without-signature))`.
    pub receipt_sha256: String,
}

/// The HMAC signature over this receipt's canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSignature {
    /// Signature algorithm, always `"hmac-sha256"`.
    pub algorithm: String,
    /// The FC Signer key id that produced this signature.
    pub key_id: String,
    /// Lowercase-hex signature value.
    pub value: String,
}

// ============================================================================
// SECTION: Judge Advisory Receipt
// ============================================================================

/// A signed attestation binding a run's plan and ledger.
///
/// # Invariants
/// - Dry-run receipts always have `enforceable = false`.
/// - `subject.subject_digests` equal the canonical hashes of the plan and
///   ledger this receipt is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeAdvisoryReceipt {
    /// Receipt identifier.
    pub id: String,
    /// The issuing service.
    pub issuer: Issuer,
    /// The run this receipt is bound to.
    pub run_id: RunId,
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Whether this receipt authorizes an actual side effect.
    pub enforceable: bool,
    /// Ordered human-readable reasons (policy denial messages, if any).
    pub reasons: Vec<String>,
    /// What this receipt attests to.
    pub subject: Subject,
    /// Receipt-level digests.
    pub digests: ReceiptDigests,
    /// The HMAC signature, present once signed.
    pub signature: ReceiptSignature,
    /// When this receipt was issued.
    pub issued_at: Timestamp,
}

impl JudgeAdvisoryReceipt {
    /// Returns a copy of this receipt with `signature.value` blanked, as
    /// used when computing `receiptSha256` (the signature cannot sign over
    /// itself).
    #[must_use]
    pub fn without_signature(&self) -> Self {
        Self {
            signature: ReceiptSignature {
                value: String::new(),
                ..self.signature.clone()
            },
            ..self.clone()
        }
    }

    /// Returns `true` when the advisory invariant holds: a dry-run receipt
    /// (`enforceable = false`) never claims enforceability.
    #[must_use]
    pub fn upholds_advisory_invariant(&self, is_dry_run: bool) -> bool {
        !is_dry_run || !self.enforceable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> JudgeAdvisoryReceipt {
        JudgeAdvisoryReceipt {
            id: "advisory-1".to_owned(),
            issuer: Issuer {
                id: "fc-signer-1".to_owned(),
                endpoint: "local".to_owned(),
            },
            run_id: RunId::generate(),
            tenant_id: TenantId::new("keon-public"),
            enforceable: false,
            reasons: Vec::new(),
            subject: Subject {
                tenant_id: TenantId::new("keon-public"),
                subject_digests: SubjectDigests {
                    plan_sha256: "abc".to_owned(),
                    ledger_sha256: "def".to_owned(),
                },
            },
            digests: ReceiptDigests {
                receipt_sha256: "ghi".to_owned(),
            },
            signature: ReceiptSignature {
                algorithm: "hmac-sha256".to_owned(),
                key_id: "key-1".to_owned(),
                value: "feed".to_owned(),
            },
            issued_at: Timestamp::now(),
        }
    }

    #[test]
    fn dry_run_advisory_upholds_invariant() {
        assert!(sample().upholds_advisory_invariant(true));
    }

    #[test]
    fn without_signature_blanks_value_only() {
        let receipt = sample();
        let stripped = receipt.without_signature();
        assert_eq!(stripped.signature.value, "");
        assert_eq!(stripped.signature.key_id, receipt.signature.key_id);
    }
}
