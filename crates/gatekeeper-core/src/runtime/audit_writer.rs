// crates/gatekeeper-core/src/runtime/audit_writer.rs
// ============================================================================
// Module: Gatekeeper Audit Writer
// Description: Seals a decision receipt as evidence and optionally
// materializes it to disk.
// Purpose: Implement writeReceiptAndPack(receipt, artifactId, from?, to?).
// Dependencies: crate::{core, interfaces}, tokio-util
// ============================================================================

//! ## Overview
//! A missing download capability on the Governance SDK is not a bypass: the
//! evidence record is still created, and the outcome explicitly records that
//! no on-disk pack path exists rather than silently succeeding as if one did.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tokio_util::sync::CancellationToken;

use crate::core::CorrelationId;
use crate::core::ReceiptId;
use crate::core::TenantId;
use crate::interfaces::ArtifactSink;
use crate::interfaces::EvidenceCreateRequest;
use crate::interfaces::GovernanceSdk;
use crate::interfaces::GovernanceSdkError;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of sealing and (optionally) materializing a decision receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditWriteOutcome {
    /// The evidence record was created. `evidence_pack_path` is `None` when
    /// the backend exposes no download capability to materialize it.
    Written {
        /// Where the receipt itself was written, if a sink was provided.
        receipt_path: String,
        /// The evidence id minted by the Governance SDK.
        evidence_pack_id: String,
        /// Where the evidence pack was written to disk, if materialized.
        evidence_pack_path: Option<String>,
    },
}

/// Seals `receipt_id` as an evidence record and, when the backend supports
/// it, materializes the evidence pack to disk via `sink`.
///
/// # Errors
///
/// Returns [`GovernanceSdkError::CallFailed`] when evidence creation itself
/// fails. A [`GovernanceSdkError::CapabilityGap`] on download is not
/// propagated as an error: it is folded into `evidence_pack_path = None`.
pub async fn write_receipt_and_pack(
    sdk: &dyn GovernanceSdk,
    receipt_id: &ReceiptId,
    correlation_id: &CorrelationId,
    tenant_id: &TenantId,
    cancellation: &CancellationToken,
) -> Result<AuditWriteOutcome, GovernanceSdkError> {
    write_receipt_and_pack_to_sink(sdk, receipt_id, correlation_id, tenant_id, None, cancellation).await
}

/// As [`write_receipt_and_pack`], additionally writing the receipt and (when
/// downloadable) the evidence pack bytes through `sink`.
///
/// # Errors
///
/// See [`write_receipt_and_pack`].
pub async fn write_receipt_and_pack_to_sink(
    sdk: &dyn GovernanceSdk,
    receipt_id: &ReceiptId,
    correlation_id: &CorrelationId,
    tenant_id: &TenantId,
    sink: Option<&dyn ArtifactSink>,
    cancellation: &CancellationToken,
) -> Result<AuditWriteOutcome, GovernanceSdkError> {
    let receipt_content = serde_json::json!({ "receiptId": receipt_id.to_string() }).to_string().into_bytes();
    let receipt_path = format!("runs/{receipt_id}/audit/receipt.json");
    if let Some(sink) = sink {
        sink.write(&receipt_path, &receipt_content).map_err(|err| GovernanceSdkError::CallFailed(err.to_string()))?;
    }

    let created = sdk
        .create_evidence(
            EvidenceCreateRequest {
                receipt_id: receipt_id.clone(),
                canonical_hash: None,
                content: receipt_content,
                tenant_id: Some(tenant_id.clone()),
                correlation_id: Some(correlation_id.clone()),
                phase: Some("decision".to_owned()),
            },
            cancellation,
        )
        .await?;

    let evidence_pack_path = match sdk.download_evidence(&created.evidence_id, Some(&created.digest), cancellation).await {
        Ok(downloaded) => {
            let path = format!("runs/{receipt_id}/evidence/{}.json", created.evidence_id);
            if let Some(sink) = sink {
                sink.write(&path, &downloaded.content).map_err(|err| GovernanceSdkError::CallFailed(err.to_string()))?;
            }
            Some(path)
        }
        Err(GovernanceSdkError::CapabilityGap(_)) => None,
        Err(err) => return Err(err),
    };

    Ok(AuditWriteOutcome::Written {
        receipt_path,
        evidence_pack_id: created.evidence_id.to_string(),
        evidence_pack_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EvidenceId;
    use crate::core::Timestamp;
    use crate::interfaces::ActorId;
    use crate::interfaces::DecisionOutcome;
    use crate::interfaces::EvidenceCreateResult;
    use crate::interfaces::EvidenceDownloadResult;
    use crate::interfaces::EvidenceVerifyResult;
    use crate::interfaces::ToolId;
    use crate::interfaces::ToolInvokeResult;
    use async_trait::async_trait;

    struct NoDownloadSdk;

    #[async_trait]
    impl GovernanceSdk for NoDownloadSdk {
        async fn invoke_tool(
            &self,
            _tool_id: ToolId,
            _input: serde_json::Value,
            _tenant_id: &TenantId,
            _actor_id: &ActorId,
            _correlation_id: &CorrelationId,
            _decision_receipt_id: Option<&ReceiptId>,
            _cancellation: &CancellationToken,
        ) -> Result<ToolInvokeResult, GovernanceSdkError> {
            Ok(ToolInvokeResult {
                success: true,
                outcome: Some(DecisionOutcome::Approved),
                receipt_id: Some(ReceiptId::new("receipt-1")),
                decided_at_utc: Timestamp::now(),
            })
        }

        async fn create_evidence(&self, request: EvidenceCreateRequest, _cancellation: &CancellationToken) -> Result<EvidenceCreateResult, GovernanceSdkError> {
            Ok(EvidenceCreateResult {
                evidence_id: EvidenceId::new("evidence-1"),
                digest: crate::core::hashing::hash_bytes(crate::core::hashing::DEFAULT_HASH_ALGORITHM, &request.content).value,
                created_at: Timestamp::now(),
            })
        }

        async fn download_evidence(&self, _evidence_id: &EvidenceId, _expected_digest: Option<&str>, _cancellation: &CancellationToken) -> Result<EvidenceDownloadResult, GovernanceSdkError> {
            Err(GovernanceSdkError::CapabilityGap("no download endpoint".to_owned()))
        }

        async fn verify_evidence(&self, _pack_hash: &str, _cancellation: &CancellationToken) -> Result<EvidenceVerifyResult, GovernanceSdkError> {
            Ok(EvidenceVerifyResult {
                is_valid: true,
                verdict: "ok".to_owned(),
            })
        }
    }

    #[tokio::test]
    async fn capability_gap_on_download_yields_no_pack_path_not_an_error() {
        let sdk = NoDownloadSdk;
        let outcome = write_receipt_and_pack(&sdk, &ReceiptId::new("receipt-1"), &CorrelationId::new("corr-1"), &TenantId::new("t"), &CancellationToken::new())
            .await
            .expect("write_receipt_and_pack");
        let AuditWriteOutcome::Written {
            evidence_pack_path, ..
        } = outcome;
        assert!(evidence_pack_path.is_none());
    }
}
