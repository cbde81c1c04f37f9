// crates/gatekeeper-core/src/lib.rs
// ============================================================================
// Module: Gatekeeper Core Library
// Description: Public API surface for the publish gate and dual-mode pipeline.
// Purpose: Expose core types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Gatekeeper core is a governance gate and evidence sealing engine for
//! artifact publication workflows. It validates a publish packet, obtains a
//! governance decision, optionally performs bound execution, and emits a
//! cryptographically sealed, independently verifiable Proof Pack. A
//! companion dual-mode pipeline drives the same decision/seal machinery in a
//! dry-run mode that produces identical artifacts with provably zero
//! external side effects. Backend-agnostic: it integrates through explicit
//! interfaces rather than embedding a transport or a storage backend.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ArtifactIoError;
pub use interfaces::ArtifactReader;
pub use interfaces::ArtifactSink;
pub use interfaces::AuthorizationError;
pub use interfaces::AuthorizationOutcome;
pub use interfaces::AuthorizationValidator;
pub use interfaces::DecisionOutcome;
pub use interfaces::EvidenceCreateRequest;
pub use interfaces::EvidenceCreateResult;
pub use interfaces::EvidenceDownloadResult;
pub use interfaces::EvidenceVerifyResult;
pub use interfaces::EventEmitter;
pub use interfaces::FileArtifactReader;
pub use interfaces::FileArtifactSink;
pub use interfaces::GovernanceSdk;
pub use interfaces::GovernanceSdkError;
pub use interfaces::NullEmitter;
pub use interfaces::PipelineEvent;
pub use interfaces::PipelineEventType;
pub use interfaces::RecordingEmitter;
pub use interfaces::ToolId;
pub use interfaces::ToolInvokeContext;
pub use interfaces::ToolInvokeResult;

pub use runtime::CheckFailure;
pub use runtime::CompletedRun;
pub use runtime::ExecutionRequest;
pub use runtime::GateConfig;
pub use runtime::GateStateMachine;
pub use runtime::IntentStore;
pub use runtime::LivePort;
pub use runtime::NullSinkPort;
pub use runtime::PipelineOrchestrator;
pub use runtime::PipelineResult;
pub use runtime::PolicyEvaluation;
pub use runtime::ProofPackBuilder;
pub use runtime::ProofPackBuilderError;
pub use runtime::ProofPackVerifier;
pub use runtime::SideEffectPort;
pub use runtime::SideEffectPortError;
pub use runtime::VerificationReport;
pub use runtime::audit_writer;
pub use runtime::evaluate_policy;
pub use runtime::pipeline_stages;
