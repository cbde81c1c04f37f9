// crates/gatekeeper-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Gatekeeper Pipeline Orchestrator
// Description: Drives the dual-mode pipeline stages end to end for one run.
// Purpose: Own stage sequencing, the mode branch at Execute, and Seal.
// Dependencies: crate::{core, interfaces, runtime::{pipeline_stages, policy,
// side_effect_port}}
// ============================================================================

//! ## Overview
//! The orchestrator validates `run.mode` first, then drives Discover, Select,
//! Verify, Evaluate, and Plan in order, branches at Execute on mode, composes
//! the sealed [`crate::core::ProofLedger`], and emits the full canonical event
//! sequence regardless of outcome. Any stage error is converted to a
//! `PipelineResult` with `success = false`; no partial artifact is persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::ApproverSummary;
use crate::core::Issuer;
use crate::core::JudgeAdvisoryReceipt;
use crate::core::MarketOpsRun;
use crate::core::Mode;
use crate::core::PublicationPlan;
use crate::core::ReceiptDigests;
use crate::core::ReceiptSignature;
use crate::core::Subject;
use crate::core::SubjectDigests;
use crate::core::Timestamp;
use crate::core::fc_signer::FcSigner;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::hash_object;
use crate::core::plan_ledger::ProofLedger;
use crate::interfaces::EventEmitter;
use crate::interfaces::PipelineEvent;
use crate::interfaces::PipelineEventType;
use crate::runtime::pipeline_stages;
use crate::runtime::pipeline_stages::EvaluationOutcome;
use crate::runtime::side_effect_port::IntentStore;
use crate::runtime::side_effect_port::SideEffectPort;
use crate::runtime::side_effect_port::SideEffectRequest;

// ============================================================================
// SECTION: Pipeline Result
// ============================================================================

/// The end-to-end outcome of driving one run through every stage.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Whether the pipeline reached Seal without error.
    pub success: bool,
    /// The error message, present only when `success = false`.
    pub error_message: Option<String>,
    /// The publication plan, present once Plan has run.
    pub plan: Option<PublicationPlan>,
    /// The sealed ledger, present once Seal has run.
    pub ledger: Option<ProofLedger>,
    /// The signed advisory receipt, present only in `DryRun` mode.
    pub advisory_receipt: Option<JudgeAdvisoryReceipt>,
    /// The derived approver summary.
    pub summary: Option<ApproverSummary>,
}

impl PipelineResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            plan: None,
            ledger: None,
            advisory_receipt: None,
            summary: None,
        }
    }
}

// ============================================================================
// SECTION: Pipeline Orchestrator
// ============================================================================

/// Drives the fixed Discover → Select → Verify → Evaluate → Plan → Execute →
/// Seal sequence for one [`MarketOpsRun`].
pub struct PipelineOrchestrator<'a> {
    emitter: &'a dyn EventEmitter,
    fc_signer: &'a FcSigner,
}

impl<'a> PipelineOrchestrator<'a> {
    /// Builds an orchestrator bound to an event emitter and the FC signer
    /// used to sign dry-run advisory receipts.
    #[must_use]
    pub fn new(emitter: &'a dyn EventEmitter, fc_signer: &'a FcSigner) -> Self {
        Self {
            emitter,
            fc_signer,
        }
    }

    /// Runs `run` to completion through every stage, executing side effects
    /// through `port` at the Execute boundary.
    pub async fn run(&self, run: &MarketOpsRun, port: &dyn SideEffectPort, intent_store: &IntentStore) -> PipelineResult {
        self.emit(run, PipelineEventType::RunStarted, None, "started");

        let discovered = self.stage(run, "discover", || async { Ok::<_, String>(pipeline_stages::discover(run).await) }).await;
        let discovered = match discovered {
            Ok(discovered) => discovered,
            Err(message) => return PipelineResult::failure(message),
        };

        let selected = pipeline_stages::select(discovered);
        let verified = pipeline_stages::verify(selected);

        self.emit(run, PipelineEventType::StageStarted, Some("evaluate"), "started");
        let outcome = pipeline_stages::evaluate(run, &verified);
        self.emit(run, PipelineEventType::StageCompleted, Some("evaluate"), "completed");

        self.emit(run, PipelineEventType::StageStarted, Some("plan"), "started");
        let plan = pipeline_stages::plan(run, &run.tenant_id, &outcome);
        self.emit(run, PipelineEventType::PlanGenerated, Some("plan"), "generated");

        let receipts = self.execute(run, &outcome, port, intent_store).await;

        let ledger_intents = intent_store.snapshot_for_run(run.run_id);
        let mut ledger = ProofLedger::new(run.run_id, run.tenant_id.clone(), run.mode, ledger_intents, receipts);

        let advisory_receipt = if run.mode == Mode::DryRun {
            match self.mint_advisory_receipt(run, &plan, &mut ledger, &outcome) {
                Ok(receipt) => Some(receipt),
                Err(message) => return PipelineResult::failure(message),
            }
        } else {
            None
        };

        self.emit(run, PipelineEventType::LedgerSealed, None, "sealed");
        if advisory_receipt.is_some() {
            self.emit(run, PipelineEventType::JudgeAdvisoryIssued, None, "issued");
            self.emit(run, PipelineEventType::JudgeReceiptIssued, None, "issued");
        }

        let mut issue_counts: BTreeMap<String, usize> = BTreeMap::new();
        for artifact in &verified {
            for issue in &artifact.artifact.issues {
                *issue_counts.entry(issue.issue_type.clone()).or_insert(0) += 1;
            }
        }
        let policy_verdict = if outcome.policy.is_approved {
            "approved".to_owned()
        } else {
            outcome
                .policy
                .verdicts
                .iter()
                .find_map(|verdict| verdict.policy_denial_reasons.first().cloned())
                .unwrap_or_else(|| "denied".to_owned())
        };
        let summary = ApproverSummary::derive(&plan, issue_counts, &policy_verdict);

        self.emit(run, PipelineEventType::RunCompleted, None, "completed");

        PipelineResult {
            success: true,
            error_message: None,
            plan: Some(plan),
            ledger: Some(ledger),
            advisory_receipt,
            summary: Some(summary),
        }
    }

    async fn stage<T, F, Fut>(&self, run: &MarketOpsRun, name: &str, body: F) -> Result<T, String>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, String>>,
    {
        self.emit(run, PipelineEventType::StageStarted, Some(name), "started");
        let result = body().await;
        match &result {
            Ok(_) => self.emit(run, PipelineEventType::StageCompleted, Some(name), "completed"),
            Err(message) => self.emit(run, PipelineEventType::StageCompleted, Some(name), message),
        }
        result
    }

    async fn execute(
        &self,
        run: &MarketOpsRun,
        outcome: &EvaluationOutcome,
        port: &dyn SideEffectPort,
        intent_store: &IntentStore,
    ) -> Vec<crate::core::SideEffectReceipt> {
        self.emit(run, PipelineEventType::StageStarted, Some("execute"), "started");
        if run.mode == Mode::DryRun {
            for intent in &outcome.intents {
                let request = SideEffectRequest {
                    kind: intent.kind,
                    target: intent.target.clone(),
                    params: intent.params.clone(),
                    blocked_by_policy: intent.blocked_by_policy,
                    policy_denial_reasons: intent.policy_denial_reasons.clone(),
                };
                // The null sink never returns a receipt or errors for a DryRun
                // run; every proposed intent is recorded regardless of policy
                // verdict, since nothing actually mutates in this mode.
                let _ = port.apply(run, request, Some(&intent.required_authorization)).await;
            }
            self.emit(run, PipelineEventType::ExecuteBlocked, Some("execute"), "blocked_by_mode");
            self.emit(run, PipelineEventType::StageCompleted, Some("execute"), "completed");
            return Vec::new();
        }
        let mut receipts = Vec::with_capacity(outcome.intents.len());
        for intent in &outcome.intents {
            if intent.blocked_by_policy {
                intent_store.append(intent.clone());
                continue;
            }
            let request = SideEffectRequest {
                kind: intent.kind,
                target: intent.target.clone(),
                params: intent.params.clone(),
                blocked_by_policy: intent.blocked_by_policy,
                policy_denial_reasons: intent.policy_denial_reasons.clone(),
            };
            if let Ok(Some(receipt)) = port.apply(run, request, Some(&intent.required_authorization)).await {
                receipts.push(receipt);
            }
            intent_store.append(intent.clone());
        }
        self.emit(run, PipelineEventType::StageCompleted, Some("execute"), "completed");
        receipts
    }

    fn mint_advisory_receipt(
        &self,
        run: &MarketOpsRun,
        plan: &PublicationPlan,
        ledger: &mut ProofLedger,
        outcome: &EvaluationOutcome,
    ) -> Result<JudgeAdvisoryReceipt, String> {
        let plan_sha256 = hash_object(DEFAULT_HASH_ALGORITHM, plan).map_err(|err| err.to_string())?.value;
        let ledger_sha256 = hash_object(DEFAULT_HASH_ALGORITHM, &ledger.without_receipt_fields()).map_err(|err| err.to_string())?.value;
        let reasons: Vec<String> = outcome.intents.iter().flat_map(|intent| intent.policy_denial_reasons.clone()).collect();

        let unsigned = JudgeAdvisoryReceipt {
            id: format!("advisory-{}", run.run_id),
            issuer: Issuer {
                id: self.fc_signer.key_id().to_owned(),
                endpoint: "local".to_owned(),
            },
            run_id: run.run_id,
            tenant_id: run.tenant_id.clone(),
            enforceable: false,
            reasons,
            subject: Subject {
                tenant_id: run.tenant_id.clone(),
                subject_digests: SubjectDigests {
                    plan_sha256,
                    ledger_sha256,
                },
            },
            digests: ReceiptDigests {
                receipt_sha256: String::new(),
            },
            signature: ReceiptSignature {
                algorithm: "hmac-sha256".to_owned(),
                key_id: self.fc_signer.key_id().to_owned(),
                value: String::new(),
            },
            issued_at: Timestamp::now(),
        };

        let receipt_sha256 = hash_object(DEFAULT_HASH_ALGORITHM, &unsigned.without_signature()).map_err(|err| err.to_string())?.value;
        let mut signed = unsigned;
        signed.digests.receipt_sha256.clone_from(&receipt_sha256);
        let canonical = crate::core::hashing::canonicalize(&signed.without_signature()).map_err(|err| err.to_string())?;
        signed.signature.value = self.fc_signer.sign(&canonical);

        ledger.seal(signed.id.clone(), receipt_sha256).map_err(|err| err.to_string())?;
        Ok(signed)
    }

    fn emit(&self, run: &MarketOpsRun, event_type: PipelineEventType, stage: Option<&str>, status: &str) {
        self.emitter.emit(PipelineEvent {
            event_type,
            run_id: run.run_id,
            mode: run.mode,
            stage: stage.map(ToOwned::to_owned),
            status: status.to_owned(),
            timestamp: Timestamp::now(),
        });
    }
}
