// crates/gatekeeper-core/src/core/side_effect.rs
// ============================================================================
// Module: Gatekeeper Side-Effect Records
// Description: Intents, receipts, and their shared `Kind`/`Target` vocabulary.
// Purpose: Model external mutations as data, never as direct calls.
// Dependencies: crate::core::{identifiers, run, time}, serde
// ============================================================================

//! ## Overview
//! An intent never itself mutates anything; it is a recorded proposal. A
//! receipt records an actual attempted effect and exists only in `Prod` mode.
//! Both carry the authoring run's `mode` so that downstream code (the seal
//! stage, the policy evaluator, the Proof Pack verifier) can check the
//! dry-run invariants without re-consulting the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::IntentId;
use crate::core::identifiers::RunId;
use crate::core::run::Mode;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Kind / Target
// ============================================================================

/// The family of external mutation an intent or receipt represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SideEffectKind {
    /// Publishing a release artifact.
    PublishRelease,
    /// Publishing a social/forum post about an artifact.
    PublishPost,
    /// Tagging a repository.
    TagRepo,
    /// Opening a pull request.
    OpenPr,
}

/// The system and reference a side effect targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideEffectTarget {
    /// The external system, e.g. `"github"` or `"npm"`.
    pub system: String,
    /// The reference within that system, e.g. a branch or package name.
    #[serde(rename = "ref")]
    pub target_ref: String,
}

// ============================================================================
// SECTION: Authorization Requirement
// ============================================================================

/// The authorization an intent requires before it may be executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredAuthorization {
    /// The receipt type expected to authorize this intent.
    pub receipt_type: String,
    /// Whether an enforceable (non-advisory) receipt is required.
    pub enforceable_required: bool,
}

// ============================================================================
// SECTION: Side-Effect Intent
// ============================================================================

/// A recorded proposal to perform an external mutation.
///
/// # Invariants
/// - `mode = DryRun ⇒ blocked_by_mode = true`.
/// - `mode = Prod ⇒ required_authorization.enforceable_required = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideEffectIntent {
    /// Intent identifier.
    pub intent_id: IntentId,
    /// The run this intent was recorded under.
    pub run_id: RunId,
    /// The authoring run's mode.
    pub mode: Mode,
    /// The kind of mutation proposed.
    pub kind: SideEffectKind,
    /// The system/ref this intent targets.
    pub target: SideEffectTarget,
    /// Opaque parameters, e.g. `{"branch": "main", "action": "remove"}`.
    pub params: serde_json::Map<String, serde_json::Value>,
    /// When this intent was recorded.
    pub created_at_utc: Timestamp,
    /// Whether the dry-run port blocked this intent (always true in dry-run).
    pub blocked_by_mode: bool,
    /// The authorization this intent requires.
    pub required_authorization: RequiredAuthorization,
    /// Whether the policy evaluator denied this intent.
    pub blocked_by_policy: bool,
    /// Ordered denial reason ids from the policy evaluator.
    pub policy_denial_reasons: Vec<String>,
    /// Hash binding this intent to its canonical form, once computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_digest: Option<String>,
}

impl SideEffectIntent {
    /// Returns `true` when this intent upholds the mode/authorization
    /// invariants documented on [`SideEffectIntent`].
    #[must_use]
    pub fn upholds_mode_invariants(&self) -> bool {
        match self.mode {
            Mode::DryRun => self.blocked_by_mode,
            Mode::Prod => self.required_authorization.enforceable_required,
        }
    }
}

// ============================================================================
// SECTION: Side-Effect Receipt
// ============================================================================

/// A recorded actual attempted effect. Only ever produced in `Prod` mode.
///
/// # Invariants
/// - `mode = DryRun ⇒ success = false ∧ error_message = "blocked_by_mode"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideEffectReceipt {
    /// Receipt identifier, distinct from a Governance SDK receipt id.
    pub id: IntentId,
    /// The authoring run's mode.
    pub mode: Mode,
    /// The kind of mutation attempted.
    pub kind: SideEffectKind,
    /// The system/ref targeted.
    pub target: SideEffectTarget,
    /// Whether the mutation succeeded.
    pub success: bool,
    /// The failure reason, present when `success = false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When this attempt was executed.
    pub executed_at: Timestamp,
}

impl SideEffectReceipt {
    /// Builds the fixed `blocked_by_mode` failed receipt a dry-run port
    /// would produce were it ever (incorrectly) asked to execute.
    #[must_use]
    pub fn blocked_by_mode(id: IntentId, kind: SideEffectKind, target: SideEffectTarget) -> Self {
        Self {
            id,
            mode: Mode::DryRun,
            kind,
            target,
            success: false,
            error_message: Some("blocked_by_mode".to_owned()),
            executed_at: Timestamp::now(),
        }
    }

    /// Returns `true` when this receipt upholds the dry-run invariant
    /// documented on [`SideEffectReceipt`].
    #[must_use]
    pub fn upholds_mode_invariant(&self) -> bool {
        self.mode != Mode::DryRun || (!self.success && self.error_message.as_deref() == Some("blocked_by_mode"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_target() -> SideEffectTarget {
        SideEffectTarget {
            system: "github".to_owned(),
            target_ref: "main".to_owned(),
        }
    }

    #[test]
    fn blocked_receipt_upholds_invariant() {
        let receipt = SideEffectReceipt::blocked_by_mode(IntentId::new("intent-1"), SideEffectKind::TagRepo, sample_target());
        assert!(receipt.upholds_mode_invariant());
    }

    #[test]
    fn dry_run_intent_requires_blocked_flag() {
        let intent = SideEffectIntent {
            intent_id: IntentId::new("intent-1"),
            run_id: RunId::generate(),
            mode: Mode::DryRun,
            kind: SideEffectKind::OpenPr,
            target: sample_target(),
            params: serde_json::Map::new(),
            created_at_utc: Timestamp::now(),
            blocked_by_mode: true,
            required_authorization: RequiredAuthorization {
                receipt_type: "advisory".to_owned(),
                enforceable_required: false,
            },
            blocked_by_policy: false,
            policy_denial_reasons: Vec::new(),
            intent_digest: None,
        };
        assert!(intent.upholds_mode_invariants());
    }
}
