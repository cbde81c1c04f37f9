// crates/gatekeeper-http/src/state.rs
// ============================================================================
// Module: Gatekeeper HTTP State
// Description: Shared application state for the Axum router.
// Purpose: Own the in-memory run registry and the shared gate/pipeline
// dependencies every handler needs.
// Dependencies: gatekeeper-core, std::sync
// ============================================================================

//! ## Overview
//! The HTTP surface keeps every run's artifacts in memory, keyed by
//! [`RunId`]. There is no persistence beyond the Proof Pack a caller
//! explicitly seals via `POST /marketops/proofpack`; restarting the process
//! drops every in-flight run, by design — durable state lives in the sealed
//! pack, not in this registry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use gatekeeper_core::ApproverSummary;
use gatekeeper_core::AuthorizationError;
use gatekeeper_core::AuthorizationOutcome;
use gatekeeper_core::AuthorizationValidator;
use gatekeeper_core::Ed25519Signer;
use gatekeeper_core::FcSigner;
use gatekeeper_core::IntentStore;
use gatekeeper_core::JudgeAdvisoryReceipt;
use gatekeeper_core::Mode;
use gatekeeper_core::ProofLedger;
use gatekeeper_core::PublicationPlan;
use gatekeeper_core::RequiredAuthorization;
use gatekeeper_core::RunId;
use gatekeeper_core::SideEffectIntent;
use gatekeeper_core::SideEffectTarget;
use gatekeeper_core::TenantId;

// ============================================================================
// SECTION: Run Record
// ============================================================================

/// One run's stored artifacts, as produced by the pipeline orchestrator.
pub struct RunRecord {
    /// Tenant this run belongs to.
    pub tenant_id: TenantId,
    /// Execution mode the run was started with.
    pub mode: Mode,
    /// Free-form scenario label, defaulted to `"default"` when the caller
    /// does not supply one at seal time.
    pub scenario: String,
    /// Whether the pipeline reached Seal without error.
    pub success: bool,
    /// The publication plan, present once Plan has run.
    pub plan: Option<PublicationPlan>,
    /// The sealed ledger, present once Seal has run.
    pub ledger: Option<ProofLedger>,
    /// The signed advisory receipt, present only in `DryRun` mode.
    pub advisory_receipt: Option<JudgeAdvisoryReceipt>,
    /// The derived approver summary.
    pub summary: Option<ApproverSummary>,
}

// ============================================================================
// SECTION: Default Authorization Validator
// ============================================================================

/// A fail-closed default authorization validator: every live side effect is
/// denied unless a deployment wires in a real validator. `gatekeeper-http`
/// ships this because an authorization backend is an external collaborator,
/// not a component this crate defines.
#[derive(Debug, Default)]
pub struct DenyAllValidator;

#[async_trait]
impl AuthorizationValidator for DenyAllValidator {
    async fn authorize(&self, _intent: &SideEffectIntent, _target: &SideEffectTarget) -> Result<AuthorizationOutcome, AuthorizationError> {
        Ok(AuthorizationOutcome::Deny)
    }
}

// ============================================================================
// SECTION: Application State
// ============================================================================

/// Shared state handed to every Axum handler. The dual-mode pipeline this
/// surface drives never calls the Governance SDK directly (only the gate's
/// `precheck`/`gate` flow does, and that flow lives in `gatekeeper-cli`), so
/// no SDK handle is held here.
pub struct AppState {
    /// Signs dry-run advisory receipts.
    pub fc_signer: FcSigner,
    /// Signs sealed Proof Pack run manifests.
    pub ed25519_signer: Ed25519Signer,
    /// Authorizes live-mode side effects.
    pub authorization: Box<dyn AuthorizationValidator>,
    /// Append-only store of recorded side-effect intents, shared across runs.
    pub intent_store: IntentStore,
    /// In-memory run registry.
    pub runs: Mutex<HashMap<RunId, RunRecord>>,
    /// Directory `POST /marketops/proofpack` seals Proof Packs under.
    pub proofpack_root: PathBuf,
    /// The port this server is bound to, echoed by `GET /health`.
    pub port: u16,
}

impl AppState {
    /// Builds application state from its constituent parts.
    #[must_use]
    pub fn new(
        fc_signer: FcSigner,
        ed25519_signer: Ed25519Signer,
        authorization: Box<dyn AuthorizationValidator>,
        proofpack_root: PathBuf,
        port: u16,
    ) -> Self {
        Self {
            fc_signer,
            ed25519_signer,
            authorization,
            intent_store: IntentStore::new(),
            runs: Mutex::new(HashMap::new()),
            proofpack_root,
            port,
        }
    }
}
