// crates/gatekeeper-governance-client/src/http_client.rs
// ============================================================================
// Module: HTTP Governance Client
// Description: GovernanceSdk implementation backed by a live Omega
// Governance SDK endpoint.
// Purpose: Translate gate/pipeline calls into bounded HTTP requests.
// Dependencies: gatekeeper-core, reqwest
// ============================================================================

//! ## Overview
//! [`HttpGovernanceClient`] speaks a small JSON-over-HTTP protocol against
//! `OMEGA_SDK_URL`: `POST /v1/tools/invoke`, `POST /v1/evidence`,
//! `GET /v1/evidence/{evidenceId}`, `POST /v1/evidence/verify`. Every call
//! carries a bounded timeout; a missing `download` capability on the
//! remote side is reported as [`gatekeeper_core::GovernanceSdkError::CapabilityGap`],
//! never silently skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use gatekeeper_core::ActorId;
use gatekeeper_core::CorrelationId;
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
use gatekeeper_core::ToolId;
use gatekeeper_core::ToolInvokeResult;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Default request timeout for every Omega Governance SDK call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// User agent sent on every outbound request.
const USER_AGENT: &str = concat!("gatekeeper-governance-client/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors constructing an [`HttpGovernanceClient`].
#[derive(Debug, Error)]
pub enum HttpGovernanceClientError {
    /// The underlying HTTP client could not be built.
    #[error("failed to build governance http client: {0}")]
    ClientBuild(String),
    /// The configured base URL is not an absolute `http(s)` URL.
    #[error("invalid governance sdk base url: {0}")]
    InvalidBaseUrl(String),
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// A [`GovernanceSdk`] backed by a live HTTP endpoint.
pub struct HttpGovernanceClient {
    /// Base URL, trailing slash stripped.
    base_url: String,
    /// Shared, bounded-timeout HTTP client.
    client: reqwest::Client,
}

impl HttpGovernanceClient {
    /// Builds a client bound to `base_url` (e.g. `https://omega.internal`).
    ///
    /// # Errors
    ///
    /// Returns [`HttpGovernanceClientError`] if the base URL is empty or the
    /// HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, HttpGovernanceClientError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(HttpGovernanceClientError::InvalidBaseUrl(base_url));
        }
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| HttpGovernanceClientError::ClientBuild(err.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Wire body for `POST /v1/tools/invoke`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeToolBody<'a> {
    /// Which tool to invoke.
    tool_id: ToolId,
    /// Tool-specific input payload.
    input: serde_json::Value,
    /// Tenant identifier.
    tenant_id: &'a TenantId,
    /// Actor identifier.
    actor_id: &'a ActorId,
    /// Correlation identifier.
    correlation_id: &'a CorrelationId,
    /// The decision receipt this invocation is bound to, for `keon.execute`.
    #[serde(skip_serializing_if = "Option::is_none")]
    decision_receipt_id: Option<&'a ReceiptId>,
}

/// Wire response for `GET /v1/evidence/{evidenceId}`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadEvidenceBody {
    /// Base64-encoded content bytes.
    content_base64: String,
    /// The content's digest, as computed by the remote side.
    digest: String,
}

/// Wire body for `POST /v1/evidence/verify`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyEvidenceBody<'a> {
    /// The Proof Pack hash being verified.
    pack_hash: &'a str,
}

// ============================================================================
// SECTION: GovernanceSdk Implementation
// ============================================================================

#[async_trait]
impl GovernanceSdk for HttpGovernanceClient {
    async fn invoke_tool(
        &self,
        tool_id: ToolId,
        input: serde_json::Value,
        tenant_id: &TenantId,
        actor_id: &ActorId,
        correlation_id: &CorrelationId,
        decision_receipt_id: Option<&ReceiptId>,
        cancellation: &CancellationToken,
    ) -> Result<ToolInvokeResult, GovernanceSdkError> {
        let body = InvokeToolBody {
            tool_id,
            input,
            tenant_id,
            actor_id,
            correlation_id,
            decision_receipt_id,
        };
        let request = self.client.post(self.url("/v1/tools/invoke")).json(&body).send();
        run_cancellable(request, cancellation).await?.json::<ToolInvokeResult>().await.map_err(|err| {
            GovernanceSdkError::CallFailed(format!("malformed tool invoke response: {err}"))
        })
    }

    async fn create_evidence(
        &self,
        request: EvidenceCreateRequest,
        cancellation: &CancellationToken,
    ) -> Result<EvidenceCreateResult, GovernanceSdkError> {
        let sent = self.client.post(self.url("/v1/evidence")).json(&request).send();
        run_cancellable(sent, cancellation).await?.json::<EvidenceCreateResult>().await.map_err(|err| {
            GovernanceSdkError::CallFailed(format!("malformed evidence create response: {err}"))
        })
    }

    async fn download_evidence(
        &self,
        evidence_id: &EvidenceId,
        expected_digest: Option<&str>,
        cancellation: &CancellationToken,
    ) -> Result<EvidenceDownloadResult, GovernanceSdkError> {
        let mut request = self.client.get(self.url(&format!("/v1/evidence/{evidence_id}")));
        if let Some(digest) = expected_digest {
            request = request.query(&[("expectedDigest", digest)]);
        }
        let response = send_cancellable(request.send(), cancellation).await?;
        if response.status() == reqwest::StatusCode::NOT_IMPLEMENTED {
            return Err(GovernanceSdkError::CapabilityGap(format!("evidence download unsupported for {evidence_id}")));
        }
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(err) => return Err(GovernanceSdkError::CallFailed(err.to_string())),
        };
        let body = response
            .json::<DownloadEvidenceBody>()
            .await
            .map_err(|err| GovernanceSdkError::CallFailed(format!("malformed evidence download response: {err}")))?;
        let content = BASE64_STANDARD
            .decode(body.content_base64)
            .map_err(|err| GovernanceSdkError::CallFailed(format!("evidence content was not valid base64: {err}")))?;
        if let Some(expected) = expected_digest
            && expected != body.digest
        {
            return Err(GovernanceSdkError::DigestMismatch(evidence_id.to_string()));
        }
        Ok(EvidenceDownloadResult {
            content,
            digest: body.digest,
        })
    }

    async fn verify_evidence(&self, pack_hash: &str, cancellation: &CancellationToken) -> Result<EvidenceVerifyResult, GovernanceSdkError> {
        let body = VerifyEvidenceBody {
            pack_hash,
        };
        let request = self.client.post(self.url("/v1/evidence/verify")).json(&body).send();
        run_cancellable(request, cancellation).await?.json::<EvidenceVerifyResult>().await.map_err(|err| {
            GovernanceSdkError::CallFailed(format!("malformed evidence verify response: {err}"))
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Races an in-flight request against cancellation, mapping transport
/// failures to [`GovernanceSdkError::CallFailed`]. Leaves status-code
/// handling to the caller.
async fn send_cancellable<F>(request: F, cancellation: &CancellationToken) -> Result<reqwest::Response, GovernanceSdkError>
where
    F: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let response = tokio::select! {
        biased;
        () = cancellation.cancelled() => return Err(GovernanceSdkError::CallFailed("cancelled".to_owned())),
        result = request => result,
    };
    response.map_err(|err| GovernanceSdkError::CallFailed(err.to_string()))
}

/// Races an in-flight request against cancellation, then maps transport and
/// non-2xx failures to [`GovernanceSdkError::CallFailed`].
async fn run_cancellable<F>(request: F, cancellation: &CancellationToken) -> Result<reqwest::Response, GovernanceSdkError>
where
    F: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let response = send_cancellable(request, cancellation).await?;
    match response.error_for_status() {
        Ok(response) => Ok(response),
        Err(err) => Err(GovernanceSdkError::CallFailed(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_base_url() {
        assert!(matches!(HttpGovernanceClient::new(""), Err(HttpGovernanceClientError::InvalidBaseUrl(_))));
    }

    #[test]
    fn strips_trailing_slash() {
        let client = HttpGovernanceClient::new("https://omega.internal/").expect("client");
        assert_eq!(client.url("/v1/tools/invoke"), "https://omega.internal/v1/tools/invoke");
    }
}
