// crates/gatekeeper-core/src/runtime/gate.rs
// ============================================================================
// Module: Gatekeeper Gate State Machine
// Description: Fail-closed Precheck -> Hash -> Decision -> Execution ->
// EvidencePack -> Verify sequence over a publish packet.
// Purpose: Turn a packet into a sealed, independently verifiable GateResult.
// Dependencies: crate::{core, interfaces, runtime::audit_writer}, tokio-util
// ============================================================================

//! ## Overview
//! Every stage can only move the gate from allowed-so-far to denied; once a
//! stage denies, the remaining stages do not run (first-failure-wins). The
//! Execution stage is optional: a packet with no bound execution params skips
//! straight to EvidencePack.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::core::ActorId;
use crate::core::CorrelationId;
use crate::core::DenialCode;
use crate::core::GateResult;
use crate::core::GovernanceEvidence;
use crate::core::PublishPacket;
use crate::core::ReceiptId;
use crate::core::TenantId;
use crate::core::Timestamp;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::hash_object;
use crate::interfaces::ArtifactSink;
use crate::interfaces::DecisionOutcome;
use crate::interfaces::GovernanceSdk;
use crate::interfaces::ToolId;
use crate::interfaces::ToolInvokeContext;
use crate::runtime::audit_writer;
use crate::runtime::audit_writer::AuditWriteOutcome;

/// Sentinel `packetHashSha256` value on a Precheck denial: the hash stage
/// never ran, so there is nothing real to report, but the field itself is
/// never `None` on a denial the caller can act on (§8 scenario 3).
const PRECHECK_HASH_UNAVAILABLE: &str = "unavailable-in-precheck";

// ============================================================================
// SECTION: Execution Request
// ============================================================================

/// Binds a decision receipt to a bound execution invocation at stage 4.
/// Built only when the gate is configured with an execution target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    /// The decision receipt this execution is bound to.
    pub decision_receipt_id: ReceiptId,
    /// Request params. Always carries `packetHashSha256`, re-checked against
    /// the Hash stage's output before the request is sent.
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl ExecutionRequest {
    /// Returns `true` when `params.packetHashSha256` equals `expected_hash`,
    /// the defensive check §4.9 stage 4 requires before sending.
    #[must_use]
    pub fn params_match_hash(&self, expected_hash: &str) -> bool {
        self.params.get("packetHashSha256").and_then(serde_json::Value::as_str) == Some(expected_hash)
    }
}

// ============================================================================
// SECTION: Gate Config
// ============================================================================

/// Static configuration the gate state machine is bound to for a tenant.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// The tenant this gate instance is scoped to. A packet bearing a
    /// different tenant id is denied at Precheck (`TENANT_MISMATCH`).
    pub tenant_id: TenantId,
    /// The actor id the caller is expected to authenticate as. A packet
    /// bearing a different actor id is denied at Precheck (`ACTOR_MISMATCH`).
    pub actor_id: ActorId,
    /// The allowlisted destination ids this tenant may publish to. Any
    /// destination outside this set is denied (`DESTINATION_NOT_ALLOWED`).
    pub allowed_destinations: Vec<String>,
    /// Operation label attached to the governance tool invocation.
    pub operation: String,
    /// When set, the gate requests bound execution (stage 4) against this
    /// target label after an approved decision. When absent, the gate skips
    /// straight from Decision to EvidencePack.
    pub execution_target: Option<String>,
}

// ============================================================================
// SECTION: Gate State Machine
// ============================================================================

/// Drives one [`PublishPacket`] through the six-stage fail-closed sequence.
pub struct GateStateMachine<'a> {
    config: GateConfig,
    sdk: &'a dyn GovernanceSdk,
    audit_sink: Option<&'a dyn ArtifactSink>,
}

impl<'a> GateStateMachine<'a> {
    /// Builds a gate bound to a config and a Governance SDK implementation.
    #[must_use]
    pub fn new(config: GateConfig, sdk: &'a dyn GovernanceSdk) -> Self {
        Self {
            config,
            sdk,
            audit_sink: None,
        }
    }

    /// Attaches an [`ArtifactSink`] the EvidencePack stage materializes the
    /// decision receipt and (when downloadable) the evidence pack under,
    /// rooted at `auditRoot` per §6. Without one, the gate still calls
    /// `evidence.create`/`evidence.download` but writes nothing to disk.
    #[must_use]
    pub fn with_audit_sink(mut self, sink: &'a dyn ArtifactSink) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    /// Runs the full sequence over `packet`, returning a [`GateResult`] that
    /// is never itself an error: every failure mode is represented as a
    /// denied result with a stable [`DenialCode`].
    pub async fn run(&self, packet: PublishPacket, cancellation: &CancellationToken) -> GateResult {
        if let Some(result) = self.precheck(&packet) {
            return result;
        }

        let packet_hash_sha256 = match hash_object(DEFAULT_HASH_ALGORITHM, &packet.without_governance()) {
            Ok(digest) => digest.value,
            Err(err) => return GateResult::deny(packet, DenialCode::GateException, err.to_string(), None),
        };

        let decision = match self
            .sdk
            .invoke_tool(
                ToolId::KeonDecide,
                serde_json::json!({ "packetHashSha256": packet_hash_sha256 }),
                &packet.tenant_id,
                &packet.actor_id,
                &packet.correlation_id,
                None,
                cancellation,
            )
            .await
        {
            Ok(result) => result,
            Err(err) => return GateResult::deny(packet, DenialCode::DecisionFailed, err.to_string(), Some(packet_hash_sha256)),
        };

        if !decision.success {
            return GateResult::deny(packet, DenialCode::DecisionFailed, "governance decision call did not succeed", Some(packet_hash_sha256));
        }
        let Some(DecisionOutcome::Approved) = decision.outcome else {
            return GateResult::deny(packet, DenialCode::DecisionNotApproved, "governance decision did not approve publication", Some(packet_hash_sha256));
        };
        let Some(receipt_id) = decision.receipt_id.clone() else {
            return GateResult::deny(packet, DenialCode::DecisionFailed, "approved decision carried no receipt id", Some(packet_hash_sha256));
        };

        if self.config.execution_target.is_some() {
            let mut params = serde_json::Map::new();
            params.insert("packetHashSha256".to_owned(), serde_json::Value::String(packet_hash_sha256.clone()));
            let request = ExecutionRequest {
                decision_receipt_id: receipt_id.clone(),
                params,
            };
            if !request.params_match_hash(&packet_hash_sha256) {
                return GateResult::deny(packet, DenialCode::ExecutionParamsInvalid, "execution request params did not carry the computed packet hash", Some(packet_hash_sha256));
            }

            let execution = self
                .sdk
                .invoke_tool(
                    ToolId::KeonExecute,
                    serde_json::Value::Object(request.params.clone()),
                    &packet.tenant_id,
                    &packet.actor_id,
                    &packet.correlation_id,
                    Some(&request.decision_receipt_id),
                    cancellation,
                )
                .await;
            match execution {
                Ok(result) if result.success => {},
                Ok(_) => return GateResult::deny(packet, DenialCode::ExecutionFailed, "execution invocation did not succeed", Some(packet_hash_sha256)),
                Err(err) => return GateResult::deny(packet, DenialCode::ExecutionFailed, err.to_string(), Some(packet_hash_sha256)),
            }
        }

        let audit_outcome =
            match audit_writer::write_receipt_and_pack_to_sink(self.sdk, &receipt_id, &packet.correlation_id, &packet.tenant_id, self.audit_sink, cancellation).await {
                Ok(outcome) => outcome,
                Err(err) => return GateResult::deny(packet, DenialCode::EvidencePackFailed, err.to_string(), Some(packet_hash_sha256)),
            };

        let verify_result = match self.sdk.verify_evidence(&packet_hash_sha256, cancellation).await {
            Ok(result) => result,
            Err(err) => return GateResult::deny(packet, DenialCode::VerifyException, err.to_string(), Some(packet_hash_sha256)),
        };
        if !verify_result.is_valid {
            return GateResult::deny(packet, DenialCode::VerifyFailed, verify_result.verdict, Some(packet_hash_sha256));
        }

        let governance = GovernanceEvidence {
            receipt_id: receipt_id.to_string(),
            outcome: "approved".to_owned(),
            decided_at_utc: decision.decided_at_utc,
            receipt_path: match &audit_outcome {
                AuditWriteOutcome::Written {
                    receipt_path, ..
                } => Some(receipt_path.clone()),
            },
            evidence_pack_path: match &audit_outcome {
                AuditWriteOutcome::Written {
                    evidence_pack_path, ..
                } => evidence_pack_path.clone(),
            },
            verification_summary: Some(verify_result.verdict),
        };
        let mut packet = packet;
        packet.governance = Some(governance.clone());
        GateResult::allow(packet, packet_hash_sha256, governance)
    }

    /// Runs the structural and tenant/actor/destination checks. Returns
    /// `Some(denied)` on the first violation found, in the §7-documented
    /// precedence order: structural invariants first, then tenant, then
    /// actor, then destination allowlist.
    ///
    /// This is the same check [`GateStateMachine::run`] applies at its first
    /// stage; it is exposed publicly so a `precheck`-only caller (the CLI's
    /// `precheck` subcommand) can run it without ever contacting the
    /// Governance SDK or attempting evidence verification.
    #[must_use]
    pub fn precheck(&self, packet: &PublishPacket) -> Option<GateResult> {
        use crate::core::PacketInvariantViolation as V;

        if let Some(violation) = packet.validate().into_iter().next() {
            let code = match violation {
                V::ArtifactIdMissing => DenialCode::ArtifactIdMissing,
                V::TenantIdMissing => DenialCode::TenantIdMissing,
                V::CorrelationIdMissing => DenialCode::CorrelationIdMissing,
                V::ActorIdMissing => DenialCode::ActorMismatch,
                V::DestinationsEmpty => DenialCode::DestinationsEmpty,
                V::DestinationInvalid => DenialCode::DestinationInvalid,
                V::PayloadRefInvalid => DenialCode::PayloadRefInvalid,
            };
            return Some(GateResult::deny(packet.clone(), code, format!("{violation:?}"), Some(PRECHECK_HASH_UNAVAILABLE.to_owned())));
        }

        if packet.tenant_id != self.config.tenant_id {
            return Some(GateResult::deny(packet.clone(), DenialCode::TenantMismatch, "packet tenant id does not match the gate's configured tenant", Some(PRECHECK_HASH_UNAVAILABLE.to_owned())));
        }
        if packet.actor_id != self.config.actor_id {
            return Some(GateResult::deny(packet.clone(), DenialCode::ActorMismatch, "packet actor id does not match the gate's configured actor", Some(PRECHECK_HASH_UNAVAILABLE.to_owned())));
        }
        if let Some(destination) = packet.destinations.iter().find(|dest| !self.config.allowed_destinations.iter().any(|allowed| allowed.as_str() == dest.as_str())) {
            return Some(GateResult::deny(packet.clone(), DenialCode::DestinationNotAllowed, format!("destination {destination} is not in the tenant's allowlist"), Some(PRECHECK_HASH_UNAVAILABLE.to_owned())));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ArtifactId;
    use crate::core::PayloadKind;
    use crate::core::PayloadRef;
    use crate::interfaces::AuthorizationError;
    use crate::interfaces::AuthorizationOutcome;
    use crate::interfaces::AuthorizationValidator;
    use crate::interfaces::DecisionOutcome;
    use crate::interfaces::EvidenceCreateRequest;
    use crate::interfaces::EvidenceCreateResult;
    use crate::interfaces::EvidenceDownloadResult;
    use crate::interfaces::EvidenceVerifyResult;
    use crate::interfaces::GovernanceSdkError;
    use crate::interfaces::ToolInvokeResult;
    use crate::core::EvidenceId;
    use crate::core::SideEffectIntent;
    use crate::core::SideEffectTarget;
    use async_trait::async_trait;

    struct StubSdk {
        decision_approved: bool,
        execution_succeeds: bool,
    }

    #[async_trait]
    impl GovernanceSdk for StubSdk {
        async fn invoke_tool(
            &self,
            tool_id: ToolId,
            _input: serde_json::Value,
            _tenant_id: &TenantId,
            _actor_id: &ActorId,
            _correlation_id: &CorrelationId,
            _decision_receipt_id: Option<&ReceiptId>,
            _cancellation: &CancellationToken,
        ) -> Result<ToolInvokeResult, GovernanceSdkError> {
            if matches!(tool_id, ToolId::KeonExecute) {
                return Ok(ToolInvokeResult {
                    success: self.execution_succeeds,
                    outcome: None,
                    receipt_id: None,
                    decided_at_utc: Timestamp::now(),
                });
            }
            Ok(ToolInvokeResult {
                success: true,
                outcome: Some(if self.decision_approved { DecisionOutcome::Approved } else { DecisionOutcome::Rejected }),
                receipt_id: Some(ReceiptId::new("receipt-1")),
                decided_at_utc: Timestamp::now(),
            })
        }

        async fn create_evidence(&self, request: EvidenceCreateRequest, _cancellation: &CancellationToken) -> Result<EvidenceCreateResult, GovernanceSdkError> {
            Ok(EvidenceCreateResult {
                evidence_id: EvidenceId::new("evidence-1"),
                digest: crate::core::hashing::hash_bytes(DEFAULT_HASH_ALGORITHM, &request.content).value,
                created_at: Timestamp::now(),
            })
        }

        async fn download_evidence(&self, _evidence_id: &EvidenceId, _expected_digest: Option<&str>, _cancellation: &CancellationToken) -> Result<EvidenceDownloadResult, GovernanceSdkError> {
            Err(GovernanceSdkError::CapabilityGap("download not implemented by stub".to_owned()))
        }

        async fn verify_evidence(&self, _pack_hash: &str, _cancellation: &CancellationToken) -> Result<EvidenceVerifyResult, GovernanceSdkError> {
            Ok(EvidenceVerifyResult {
                is_valid: true,
                verdict: "ok".to_owned(),
            })
        }
    }

    #[allow(dead_code, reason = "kept for future authorization-path gate tests")]
    struct AlwaysAllow;

    #[async_trait]
    impl AuthorizationValidator for AlwaysAllow {
        async fn authorize(&self, _intent: &SideEffectIntent, _target: &SideEffectTarget) -> Result<AuthorizationOutcome, AuthorizationError> {
            Ok(AuthorizationOutcome::Allow)
        }
    }

    fn sample_packet() -> PublishPacket {
        PublishPacket {
            artifact_id: ArtifactId::new("artifact-1"),
            artifact_type: "library".to_owned(),
            created_at_utc: Timestamp::now(),
            tenant_id: TenantId::new("keon-public"),
            correlation_id: CorrelationId::new("corr-1"),
            actor_id: ActorId::new("actor-1"),
            source_refs: Vec::new(),
            payload_ref: PayloadRef {
                kind: PayloadKind::RepoPath,
                path: "dist/artifact.tar.gz".to_owned(),
                content_type: None,
                sha256: None,
            },
            destinations: vec![crate::core::DestinationId::new("registry-a")],
            governance: None,
        }
    }

    fn sample_config() -> GateConfig {
        GateConfig {
            tenant_id: TenantId::new("keon-public"),
            actor_id: ActorId::new("actor-1"),
            allowed_destinations: vec!["registry-a".to_owned()],
            operation: "publish".to_owned(),
            execution_target: None,
        }
    }

    #[tokio::test]
    async fn approved_decision_yields_allowed_result() {
        let sdk = StubSdk {
            decision_approved: true,
            execution_succeeds: true,
        };
        let gate = GateStateMachine::new(sample_config(), &sdk);
        let result = gate.run(sample_packet(), &CancellationToken::new()).await;
        assert!(result.allowed);
        assert!(result.upholds_allowed_invariant());
    }

    #[tokio::test]
    async fn rejected_decision_yields_denied_result() {
        let sdk = StubSdk {
            decision_approved: false,
            execution_succeeds: true,
        };
        let gate = GateStateMachine::new(sample_config(), &sdk);
        let result = gate.run(sample_packet(), &CancellationToken::new()).await;
        assert!(!result.allowed);
        assert_eq!(result.denial_code.as_deref(), Some("DECISION_NOT_APPROVED"));
    }

    #[tokio::test]
    async fn tenant_mismatch_denied_before_decision_call() {
        let sdk = StubSdk {
            decision_approved: true,
            execution_succeeds: true,
        };
        let mut config = sample_config();
        config.tenant_id = TenantId::new("other-tenant");
        let gate = GateStateMachine::new(config, &sdk);
        let result = gate.run(sample_packet(), &CancellationToken::new()).await;
        assert!(!result.allowed);
        assert_eq!(result.denial_code.as_deref(), Some("TENANT_MISMATCH"));
    }

    #[tokio::test]
    async fn destination_outside_allowlist_is_denied() {
        let sdk = StubSdk {
            decision_approved: true,
            execution_succeeds: true,
        };
        let mut config = sample_config();
        config.allowed_destinations = vec!["registry-b".to_owned()];
        let gate = GateStateMachine::new(config, &sdk);
        let result = gate.run(sample_packet(), &CancellationToken::new()).await;
        assert!(!result.allowed);
        assert_eq!(result.denial_code.as_deref(), Some("DESTINATION_NOT_ALLOWED"));
    }

    #[tokio::test]
    async fn configured_execution_target_runs_and_allows_on_success() {
        let sdk = StubSdk {
            decision_approved: true,
            execution_succeeds: true,
        };
        let mut config = sample_config();
        config.execution_target = Some("keon-execute-default".to_owned());
        let gate = GateStateMachine::new(config, &sdk);
        let result = gate.run(sample_packet(), &CancellationToken::new()).await;
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn execution_failure_denies_with_execution_failed() {
        let sdk = StubSdk {
            decision_approved: true,
            execution_succeeds: false,
        };
        let mut config = sample_config();
        config.execution_target = Some("keon-execute-default".to_owned());
        let gate = GateStateMachine::new(config, &sdk);
        let result = gate.run(sample_packet(), &CancellationToken::new()).await;
        assert!(!result.allowed);
        assert_eq!(result.denial_code.as_deref(), Some("EXECUTION_FAILED"));
    }

    #[test]
    fn execution_request_detects_hash_mismatch() {
        let mut params = serde_json::Map::new();
        params.insert("packetHashSha256".to_owned(), serde_json::Value::String("abc".to_owned()));
        let request = ExecutionRequest {
            decision_receipt_id: ReceiptId::new("receipt-1"),
            params,
        };
        assert!(request.params_match_hash("abc"));
        assert!(!request.params_match_hash("def"));
    }
}
