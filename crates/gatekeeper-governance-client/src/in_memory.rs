// crates/gatekeeper-governance-client/src/in_memory.rs
// ============================================================================
// Module: In-Memory Governance SDK
// Description: A deterministic, network-free GovernanceSdk reference
// implementation.
// Purpose: Drive the gate and pipeline in tests and offline CLI runs without
// a live Omega Governance SDK endpoint.
// Dependencies: gatekeeper-core, std::sync::Mutex
// ============================================================================

//! ## Overview
//! [`InMemoryGovernanceSdk`] holds every evidence record it creates in a
//! process-local map and decides `"keon.decide"` calls according to a
//! configured [`DecisionRule`]. It is the backend `system-tests` drives the
//! gate against, and the default backend the CLI falls back to when
//! `--control-url` is not supplied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use gatekeeper_core::ActorId;
use gatekeeper_core::CorrelationId;
use gatekeeper_core::DEFAULT_HASH_ALGORITHM;
use gatekeeper_core::DecisionOutcome;
use gatekeeper_core::EvidenceCreateRequest;
use gatekeeper_core::EvidenceCreateResult;
use gatekeeper_core::EvidenceDownloadResult;
use gatekeeper_core::EvidenceId;
use gatekeeper_core::EvidenceVerifyResult;
use gatekeeper_core::GovernanceSdk;
use gatekeeper_core::GovernanceSdkError;
use gatekeeper_core::ReceiptId;
use gatekeeper_core::TenantId;
use gatekeeper_core::Timestamp;
use gatekeeper_core::ToolId;
use gatekeeper_core::ToolInvokeResult;
use gatekeeper_core::hash_bytes;
use tokio_util::sync::CancellationToken;

/// A stored evidence record: raw content plus its digest.
struct EvidenceRecord {
    /// Raw content bytes as submitted to `evidence.create`.
    content: Vec<u8>,
    /// `sha256(content)`.
    digest: String,
}

/// Decides what an in-memory `"keon.decide"` call returns.
#[derive(Debug, Clone)]
pub enum DecisionRule {
    /// Every decision call approves.
    ApproveAll,
    /// Every decision call rejects.
    RejectAll,
    /// Every decision call for the named tenant rejects; every other
    /// tenant is approved.
    RejectTenant(TenantId),
}

impl DecisionRule {
    fn evaluate(&self, tenant_id: &TenantId) -> DecisionOutcome {
        match self {
            Self::ApproveAll => DecisionOutcome::Approved,
            Self::RejectAll => DecisionOutcome::Rejected,
            Self::RejectTenant(rejected) if rejected == tenant_id => DecisionOutcome::Rejected,
            Self::RejectTenant(_) => DecisionOutcome::Approved,
        }
    }
}

// ============================================================================
// SECTION: In-Memory SDK
// ============================================================================

/// A deterministic, process-local [`GovernanceSdk`].
pub struct InMemoryGovernanceSdk {
    /// How `"keon.decide"` calls are resolved.
    decision_rule: DecisionRule,
    /// Whether `evidence.download` is supported; `false` exercises the
    /// capability-gap path.
    supports_download: bool,
    /// Evidence records keyed by their minted id.
    evidence: Mutex<HashMap<EvidenceId, EvidenceRecord>>,
    /// Monotonic counter used to mint evidence and receipt ids.
    next_id: AtomicU64,
}

impl InMemoryGovernanceSdk {
    /// Builds a fresh SDK stub that approves every decision and supports
    /// evidence download.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rule(DecisionRule::ApproveAll)
    }

    /// Builds a fresh SDK stub using the given decision rule.
    #[must_use]
    pub fn with_rule(decision_rule: DecisionRule) -> Self {
        Self {
            decision_rule,
            supports_download: true,
            evidence: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns a copy of this stub with evidence download disabled, to
    /// exercise the `CapabilityGap` fold in `audit_writer`.
    #[must_use]
    pub fn without_download(mut self) -> Self {
        self.supports_download = false;
        self
    }

    fn mint_id(&self, prefix: &str) -> String {
        let sequence = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{sequence}")
    }
}

impl Default for InMemoryGovernanceSdk {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GovernanceSdk for InMemoryGovernanceSdk {
    async fn invoke_tool(
        &self,
        tool_id: ToolId,
        _input: serde_json::Value,
        tenant_id: &TenantId,
        _actor_id: &ActorId,
        _correlation_id: &CorrelationId,
        _decision_receipt_id: Option<&ReceiptId>,
        _cancellation: &CancellationToken,
    ) -> Result<ToolInvokeResult, GovernanceSdkError> {
        let outcome = match tool_id {
            ToolId::KeonDecide => self.decision_rule.evaluate(tenant_id),
            ToolId::KeonExecute => DecisionOutcome::Approved,
        };
        Ok(ToolInvokeResult {
            success: true,
            outcome: Some(outcome),
            receipt_id: Some(ReceiptId::new(self.mint_id("receipt"))),
            decided_at_utc: Timestamp::now(),
        })
    }

    async fn create_evidence(&self, request: EvidenceCreateRequest, _cancellation: &CancellationToken) -> Result<EvidenceCreateResult, GovernanceSdkError> {
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &request.content).value;
        let evidence_id = EvidenceId::new(self.mint_id("evidence"));
        self.evidence.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(
            evidence_id.clone(),
            EvidenceRecord {
                content: request.content,
                digest: digest.clone(),
            },
        );
        Ok(EvidenceCreateResult {
            evidence_id,
            digest,
            created_at: Timestamp::now(),
        })
    }

    async fn download_evidence(
        &self,
        evidence_id: &EvidenceId,
        expected_digest: Option<&str>,
        _cancellation: &CancellationToken,
    ) -> Result<EvidenceDownloadResult, GovernanceSdkError> {
        if !self.supports_download {
            return Err(GovernanceSdkError::CapabilityGap(format!("evidence download unsupported for {evidence_id}")));
        }
        let guard = self.evidence.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = guard.get(evidence_id).ok_or_else(|| GovernanceSdkError::CallFailed(format!("unknown evidence id {evidence_id}")))?;
        if let Some(expected) = expected_digest
            && expected != record.digest
        {
            return Err(GovernanceSdkError::DigestMismatch(evidence_id.to_string()));
        }
        Ok(EvidenceDownloadResult {
            content: record.content.clone(),
            digest: record.digest.clone(),
        })
    }

    async fn verify_evidence(&self, pack_hash: &str, _cancellation: &CancellationToken) -> Result<EvidenceVerifyResult, GovernanceSdkError> {
        Ok(EvidenceVerifyResult {
            is_valid: !pack_hash.is_empty(),
            verdict: if pack_hash.is_empty() { "empty pack hash".to_owned() } else { "verified".to_owned() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cancellation() -> CancellationToken {
        CancellationToken::new()
    }

    #[tokio::test]
    async fn approve_all_approves_every_tenant() {
        let sdk = InMemoryGovernanceSdk::new();
        let tenant = TenantId::new("keon-public");
        let result = sdk
            .invoke_tool(ToolId::KeonDecide, serde_json::json!({}), &tenant, &ActorId::new("actor-1"), &CorrelationId::new("corr-1"), None, &cancellation())
            .await
            .expect("invoke_tool");
        assert_eq!(result.outcome, Some(DecisionOutcome::Approved));
    }

    #[tokio::test]
    async fn reject_tenant_rejects_only_that_tenant() {
        let rejected = TenantId::new("keon-restricted");
        let sdk = InMemoryGovernanceSdk::with_rule(DecisionRule::RejectTenant(rejected.clone()));
        let result = sdk
            .invoke_tool(ToolId::KeonDecide, serde_json::json!({}), &rejected, &ActorId::new("actor-1"), &CorrelationId::new("corr-1"), None, &cancellation())
            .await
            .expect("invoke_tool");
        assert_eq!(result.outcome, Some(DecisionOutcome::Rejected));

        let other = TenantId::new("keon-public");
        let result = sdk
            .invoke_tool(ToolId::KeonDecide, serde_json::json!({}), &other, &ActorId::new("actor-1"), &CorrelationId::new("corr-1"), None, &cancellation())
            .await
            .expect("invoke_tool");
        assert_eq!(result.outcome, Some(DecisionOutcome::Approved));
    }

    #[tokio::test]
    async fn create_then_download_round_trips_content() {
        let sdk = InMemoryGovernanceSdk::new();
        let created = sdk
            .create_evidence(
                EvidenceCreateRequest {
                    receipt_id: ReceiptId::new("receipt-1"),
                    canonical_hash: None,
                    content: b"evidence bytes".to_vec(),
                    tenant_id: None,
                    correlation_id: None,
                    phase: None,
                },
                &cancellation(),
            )
            .await
            .expect("create_evidence");
        let downloaded = sdk.download_evidence(&created.evidence_id, Some(&created.digest), &cancellation()).await.expect("download_evidence");
        assert_eq!(downloaded.content, b"evidence bytes");
    }

    #[tokio::test]
    async fn download_without_support_is_a_capability_gap() {
        let sdk = InMemoryGovernanceSdk::new().without_download();
        let created = sdk
            .create_evidence(
                EvidenceCreateRequest {
                    receipt_id: ReceiptId::new("receipt-1"),
                    canonical_hash: None,
                    content: b"x".to_vec(),
                    tenant_id: None,
                    correlation_id: None,
                    phase: None,
                },
                &cancellation(),
            )
            .await
            .expect("create_evidence");
        let result = sdk.download_evidence(&created.evidence_id, None, &cancellation()).await;
        assert!(matches!(result, Err(GovernanceSdkError::CapabilityGap(_))));
    }

    #[tokio::test]
    async fn download_with_wrong_expected_digest_fails_closed() {
        let sdk = InMemoryGovernanceSdk::new();
        let created = sdk
            .create_evidence(
                EvidenceCreateRequest {
                    receipt_id: ReceiptId::new("receipt-1"),
                    canonical_hash: None,
                    content: b"evidence bytes".to_vec(),
                    tenant_id: None,
                    correlation_id: None,
                    phase: None,
                },
                &cancellation(),
            )
            .await
            .expect("create_evidence");
        let result = sdk.download_evidence(&created.evidence_id, Some("not-the-real-digest"), &cancellation()).await;
        assert!(matches!(result, Err(GovernanceSdkError::DigestMismatch(_))));
    }
}
