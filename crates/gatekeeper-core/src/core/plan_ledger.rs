// crates/gatekeeper-core/src/core/plan_ledger.rs
// ============================================================================
// Module: Gatekeeper Plan and Ledger
// Description: PublicationPlan and ProofLedger artifact records.
// Purpose: Durable, canonicalizable summaries of a run's planned shipment
// and its recorded intents/receipts.
// Dependencies: crate::core::{identifiers, run, side_effect}, serde
// ============================================================================

//! ## Overview
//! Plan and ledger are sibling artifacts emitted at the end of the pipeline.
//! The ledger is frozen once a receipt is attached: [`ProofLedger::seal`]
//! is the only way to set `receipt_id`/`receipt_digest`, and it refuses to
//! overwrite an already-sealed ledger.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;
use crate::core::identifiers::TenantId;
use crate::core::run::Mode;
use crate::core::side_effect::SideEffectIntent;
use crate::core::side_effect::SideEffectReceipt;

// ============================================================================
// SECTION: Publication Plan
// ============================================================================

/// What a run would (and would not) ship, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationPlan {
    /// The run this plan belongs to.
    pub run_id: RunId,
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Execution mode.
    pub mode: Mode,
    /// Ordered candidates that would ship.
    pub would_ship: Vec<String>,
    /// Ordered candidates that would not ship.
    pub would_not_ship: Vec<String>,
    /// Opaque key to human-readable reason, one per denial.
    pub reasons: std::collections::BTreeMap<String, String>,
}

impl PublicationPlan {
    /// Builds an all-ship plan (no denials).
    #[must_use]
    pub fn all_ship(run_id: RunId, tenant_id: TenantId, mode: Mode, candidates: Vec<String>) -> Self {
        Self {
            run_id,
            tenant_id,
            mode,
            would_ship: candidates,
            would_not_ship: Vec::new(),
            reasons: std::collections::BTreeMap::new(),
        }
    }

    /// Builds an all-blocked plan, recording one reason per denial under a
    /// freshly minted opaque key (`denial-0`, `denial-1`, ...).
    #[must_use]
    pub fn all_blocked(
        run_id: RunId,
        tenant_id: TenantId,
        mode: Mode,
        candidates: Vec<String>,
        denial_messages: &[String],
    ) -> Self {
        let reasons = denial_messages
            .iter()
            .enumerate()
            .map(|(index, message)| (format!("denial-{index}"), message.clone()))
            .collect();
        Self {
            run_id,
            tenant_id,
            mode,
            would_ship: Vec::new(),
            would_not_ship: candidates,
            reasons,
        }
    }
}

// ============================================================================
// SECTION: Proof Ledger
// ============================================================================

/// Error returned by [`ProofLedger::seal`] when the ledger is already sealed.
#[derive(Debug, thiserror::Error)]
#[error("proof ledger is already sealed with a receipt")]
pub struct LedgerAlreadySealedError;

/// Intents and receipts recorded during a single run.
///
/// # Invariants
/// - Once `receipt_id` is set, the ledger is frozen: only [`ProofLedger::seal`]
///   may set it, and it refuses a second call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofLedger {
    /// The run this ledger belongs to.
    pub run_id: RunId,
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Execution mode.
    pub mode: Mode,
    /// Ordered recorded intents.
    pub side_effect_intents: Vec<SideEffectIntent>,
    /// Ordered recorded receipts.
    pub side_effect_receipts: Vec<SideEffectReceipt>,
    /// The advisory/enforceable receipt id bound to this ledger, once sealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<String>,
    /// The canonical hash of the bound receipt, once sealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_digest: Option<String>,
}

impl ProofLedger {
    /// Builds an unsealed ledger from the intents and receipts recorded for
    /// one run.
    #[must_use]
    pub fn new(
        run_id: RunId,
        tenant_id: TenantId,
        mode: Mode,
        side_effect_intents: Vec<SideEffectIntent>,
        side_effect_receipts: Vec<SideEffectReceipt>,
    ) -> Self {
        Self {
            run_id,
            tenant_id,
            mode,
            side_effect_intents,
            side_effect_receipts,
            receipt_id: None,
            receipt_digest: None,
        }
    }

    /// Returns a copy of this ledger with the receipt back-reference fields
    /// cleared, as used when computing `ledgerSha256` for the advisory
    /// receipt (the hash must predate the back-reference being attached).
    #[must_use]
    pub fn without_receipt_fields(&self) -> Self {
        Self {
            receipt_id: None,
            receipt_digest: None,
            ..self.clone()
        }
    }

    /// Binds a minted receipt's id and digest to this ledger, freezing it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerAlreadySealedError`] if a receipt is already bound.
    pub fn seal(&mut self, receipt_id: String, receipt_digest: String) -> Result<(), LedgerAlreadySealedError> {
        if self.receipt_id.is_some() {
            return Err(LedgerAlreadySealedError);
        }
        self.receipt_id = Some(receipt_id);
        self.receipt_digest = Some(receipt_digest);
        Ok(())
    }

    /// Returns `true` once a receipt has been bound.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.receipt_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_is_one_shot() {
        let mut ledger = ProofLedger::new(RunId::generate(), TenantId::new("t"), Mode::DryRun, Vec::new(), Vec::new());
        ledger.seal("receipt-1".to_owned(), "digest-1".to_owned()).expect("first seal");
        assert!(ledger.is_sealed());
        let err = ledger.seal("receipt-2".to_owned(), "digest-2".to_owned());
        assert!(err.is_err());
        assert_eq!(ledger.receipt_id.as_deref(), Some("receipt-1"));
    }

    #[test]
    fn without_receipt_fields_clears_back_reference() {
        let mut ledger = ProofLedger::new(RunId::generate(), TenantId::new("t"), Mode::DryRun, Vec::new(), Vec::new());
        ledger.seal("receipt-1".to_owned(), "digest-1".to_owned()).expect("seal");
        let cleared = ledger.without_receipt_fields();
        assert!(cleared.receipt_id.is_none());
        assert!(cleared.receipt_digest.is_none());
    }
}
