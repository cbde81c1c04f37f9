// crates/gatekeeper-core/src/interfaces/mod.rs
// ============================================================================
// Module: Gatekeeper Interfaces
// Description: Backend-agnostic traits for the Governance SDK, events, and I/O.
// Purpose: Define the contract surfaces the runtime integrates through.
// Dependencies: async-trait, crate::core, tokio-util
// ============================================================================

//! ## Overview
//! Interfaces define how the gate and pipeline integrate with external
//! systems without embedding backend-specific details. Implementations must
//! be deterministic (where the contract calls for it) and must fail closed
//! on missing or invalid data — never silently bypass a check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::core::ActorId;
use crate::core::CorrelationId;
use crate::core::EvidenceId;
use crate::core::ReceiptId;
use crate::core::SideEffectIntent;
use crate::core::SideEffectTarget;
use crate::core::TenantId;
use crate::core::Timestamp;

pub mod fs_store;

pub use fs_store::FileArtifactReader;
pub use fs_store::FileArtifactSink;

// ============================================================================
// SECTION: Governance SDK
// ============================================================================

/// The two decision-plane operations a Governance SDK tool invocation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    /// `"keon.decide"` — request a publication decision.
    KeonDecide,
    /// `"keon.execute"` — request bound execution against a decision.
    KeonExecute,
}

/// Context attached to every tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvokeContext {
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Free-form pipeline/stage tags, e.g. `["pipeline=marketops", "stage=gate"]`.
    pub tags: Vec<String>,
    /// The operation label, e.g. `"publish"`.
    pub operation: String,
}

/// The outcome of a `"keon.decide"` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecisionOutcome {
    /// The decision approved the publication.
    Approved,
    /// The decision rejected the publication.
    Rejected,
}

/// Result of invoking a Governance SDK tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvokeResult {
    /// Whether the call itself succeeded (transport/service level).
    pub success: bool,
    /// The decision outcome, present when `success = true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DecisionOutcome>,
    /// The receipt id minted for this invocation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<ReceiptId>,
    /// When the decision was made.
    pub decided_at_utc: Timestamp,
}

/// Input to `evidence.create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceCreateRequest {
    /// The decision receipt this evidence is attached to.
    pub receipt_id: ReceiptId,
    /// A pre-computed canonical hash of the content, if the caller has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_hash: Option<String>,
    /// Raw content bytes.
    pub content: Vec<u8>,
    /// Tenant identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
    /// Correlation identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    /// Free-form phase label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// Result of `evidence.create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceCreateResult {
    /// Evidence identifier minted by the SDK.
    pub evidence_id: EvidenceId,
    /// `sha256(content)`.
    pub digest: String,
    /// When this record was created.
    pub created_at: Timestamp,
}

/// Result of `evidence.download`.
#[derive(Debug, Clone)]
pub struct EvidenceDownloadResult {
    /// The downloaded content bytes.
    pub content: Vec<u8>,
    /// The content's digest, as verified on download.
    pub digest: String,
}

/// Result of `evidence.verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceVerifyResult {
    /// Whether the pack hash verified.
    pub is_valid: bool,
    /// Free-form verdict text.
    pub verdict: String,
}

/// Errors raised by a [`GovernanceSdk`] implementation.
#[derive(Debug, Error)]
pub enum GovernanceSdkError {
    /// The call to the downstream governance service failed (transport,
    /// timeout, non-2xx response).
    #[error("governance sdk call failed: {0}")]
    CallFailed(String),
    /// The SDK does not expose the requested capability (e.g. no download
    /// operation). Reported up as a typed gap; callers must not bypass it.
    #[error("governance sdk capability gap: {0}")]
    CapabilityGap(String),
    /// A downloaded evidence record failed digest verification.
    #[error("governance sdk evidence digest mismatch for {0}")]
    DigestMismatch(String),
}

/// The downstream governance service's two operation families: tool
/// invocation (decide/execute) and evidence management.
#[async_trait]
pub trait GovernanceSdk: Send + Sync {
    /// Invokes a governance tool.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceSdkError::CallFailed`] on transport or service
    /// failure.
    async fn invoke_tool(
        &self,
        tool_id: ToolId,
        input: serde_json::Value,
        tenant_id: &TenantId,
        actor_id: &ActorId,
        correlation_id: &CorrelationId,
        decision_receipt_id: Option<&ReceiptId>,
        cancellation: &CancellationToken,
    ) -> Result<ToolInvokeResult, GovernanceSdkError>;

    /// Creates an evidence record.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceSdkError::CallFailed`] on transport or service
    /// failure.
    async fn create_evidence(
        &self,
        request: EvidenceCreateRequest,
        cancellation: &CancellationToken,
    ) -> Result<EvidenceCreateResult, GovernanceSdkError>;

    /// Downloads a previously created evidence record, verifying its digest.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceSdkError::CapabilityGap`] when the backend does
    /// not support download, and [`GovernanceSdkError::DigestMismatch`] when
    /// the downloaded content does not match `expected_digest`.
    async fn download_evidence(
        &self,
        evidence_id: &EvidenceId,
        expected_digest: Option<&str>,
        cancellation: &CancellationToken,
    ) -> Result<EvidenceDownloadResult, GovernanceSdkError>;

    /// Verifies a Proof Pack hash against the governance service.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceSdkError::CallFailed`] on transport or service
    /// failure.
    async fn verify_evidence(
        &self,
        pack_hash: &str,
        cancellation: &CancellationToken,
    ) -> Result<EvidenceVerifyResult, GovernanceSdkError>;
}

// ============================================================================
// SECTION: Event Emitter
// ============================================================================

/// The 9 canonical pipeline event types from §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PipelineEventType {
    /// `run.started`.
    RunStarted,
    /// `stage.started`.
    StageStarted,
    /// `stage.completed`.
    StageCompleted,
    /// `plan.generated`.
    PlanGenerated,
    /// `execute.blocked`.
    ExecuteBlocked,
    /// `ledger.sealed`.
    LedgerSealed,
    /// `judge.advisory_issued`.
    JudgeAdvisoryIssued,
    /// `judge.receipt_issued`.
    JudgeReceiptIssued,
    /// `run.completed`.
    RunCompleted,
}

/// One emitted pipeline event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEvent {
    /// The event type.
    pub event_type: PipelineEventType,
    /// The run this event belongs to.
    pub run_id: crate::core::RunId,
    /// Execution mode.
    pub mode: crate::core::Mode,
    /// The stage name, present for `stage.*` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Free-form status label.
    pub status: String,
    /// When this event was emitted.
    pub timestamp: Timestamp,
}

/// Best-effort event sink. Emission failure MUST NOT affect pipeline
/// correctness; implementations should drop on handler failure rather than
/// propagate an error.
pub trait EventEmitter: Send + Sync {
    /// Emits one pipeline event. Never returns an error: a failing handler
    /// is swallowed by the implementation, per the best-effort contract.
    fn emit(&self, event: PipelineEvent);
}

/// An emitter that discards every event. Used where no transport is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEmitter;

impl EventEmitter for NullEmitter {
    fn emit(&self, _event: PipelineEvent) {}
}

/// An emitter that records every event in memory, for tests and the HTTP
/// layer's WebSocket fan-out.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    events: std::sync::Mutex<Vec<PipelineEvent>>,
}

impl RecordingEmitter {
    /// Builds an empty recording emitter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every event recorded so far, in emission order.
    #[must_use]
    #[allow(clippy::missing_panics_doc, reason = "poisoning would indicate a prior panic in another thread; not a normal-path error")]
    pub fn snapshot(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

// ============================================================================
// SECTION: Authorization Validator (live side-effect port)
// ============================================================================

/// The outcome of authorizing a live side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// The mutation is authorized.
    Allow,
    /// The mutation is denied.
    Deny,
}

/// Errors raised by an [`AuthorizationValidator`].
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// The validator's backend call failed.
    #[error("authorization validator error: {0}")]
    ValidatorFailed(String),
}

/// Validates whether a live side effect may proceed.
#[async_trait]
pub trait AuthorizationValidator: Send + Sync {
    /// Authorizes one side effect against its target.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError`] when the validator itself fails; a
    /// deliberate deny is `Ok(AuthorizationOutcome::Deny)`, not an error.
    async fn authorize(&self, intent: &SideEffectIntent, target: &SideEffectTarget) -> Result<AuthorizationOutcome, AuthorizationError>;
}

// ============================================================================
// SECTION: Artifact Sink / Reader (Proof Pack I/O)
// ============================================================================

/// Errors raised writing or reading Proof Pack artifact bytes.
#[derive(Debug, Error)]
pub enum ArtifactIoError {
    /// The underlying filesystem operation failed.
    #[error("artifact io error: {0}")]
    Io(String),
}

/// Writes Proof Pack artifact bytes to durable storage.
pub trait ArtifactSink {
    /// Writes `bytes` at `path`, relative to the sink's root, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactIoError`] when the write fails.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), ArtifactIoError>;
}

/// Reads Proof Pack artifact bytes back from durable storage.
pub trait ArtifactReader {
    /// Reads the bytes at `path`, relative to the reader's root.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactIoError`] when the read fails (including missing
    /// file).
    fn read(&self, path: &str) -> Result<Vec<u8>, ArtifactIoError>;
}
