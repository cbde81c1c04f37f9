// crates/gatekeeper-core/src/core/mod.rs
// ============================================================================
// Module: Gatekeeper Core Types
// Description: Canonical data model for publish packets, runs, and Proof Packs.
// Purpose: Provide stable, serializable types shared across the whole crate.
// Dependencies: serde, serde_json, time, uuid
// ============================================================================

//! ## Overview
//! Core types are the canonical source of truth for every derived surface
//! (HTTP, CLI, Proof Pack files). They carry no I/O and no async.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod advisory;
pub mod ed25519_signer;
pub mod evidence;
pub mod fc_signer;
pub mod gate_result;
pub mod hashing;
pub mod identifiers;
pub mod packet;
pub mod plan_ledger;
pub mod proofpack_model;
pub mod run;
pub mod side_effect;
pub mod summary;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use advisory::Issuer;
pub use advisory::JudgeAdvisoryReceipt;
pub use advisory::ReceiptDigests;
pub use advisory::ReceiptSignature;
pub use advisory::Subject;
pub use advisory::SubjectDigests;
pub use ed25519_signer::Ed25519Signer;
pub use ed25519_signer::Ed25519SignerError;
pub use ed25519_signer::KEY_ID_PREFIX;
pub use evidence::EvidenceDownloadError;
pub use evidence::EvidenceRecord;
pub use fc_signer::FcSigner;
pub use fc_signer::FcSignerError;
pub use gate_result::DenialCode;
pub use gate_result::FailureStage;
pub use gate_result::GateResult;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::canonicalize;
pub use hashing::hash_bytes;
pub use hashing::hash_object;
pub use hashing::verify_hash;
pub use identifiers::ActorId;
pub use identifiers::ArtifactId;
pub use identifiers::CorrelationId;
pub use identifiers::DestinationId;
pub use identifiers::EvidenceId;
pub use identifiers::IntentId;
pub use identifiers::PackId;
pub use identifiers::ReceiptId;
pub use identifiers::RunId;
pub use identifiers::ScenarioLabel;
pub use identifiers::TenantId;
pub use packet::GovernanceEvidence;
pub use packet::PacketInvariantViolation;
pub use packet::PayloadKind;
pub use packet::PayloadRef;
pub use packet::PublishPacket;
pub use plan_ledger::LedgerAlreadySealedError;
pub use plan_ledger::ProofLedger;
pub use plan_ledger::PublicationPlan;
pub use proofpack_model::ArtifactRecord;
pub use proofpack_model::FC_BINDING_CHECKS;
pub use proofpack_model::FcBindingRecord;
pub use proofpack_model::ManifestScope;
pub use proofpack_model::ManifestSignature;
pub use proofpack_model::PackIndex;
pub use proofpack_model::PackIndexRun;
pub use proofpack_model::RunManifest;
pub use run::MarketOpsRun;
pub use run::Mode;
pub use side_effect::RequiredAuthorization;
pub use side_effect::SideEffectIntent;
pub use side_effect::SideEffectKind;
pub use side_effect::SideEffectReceipt;
pub use side_effect::SideEffectTarget;
pub use summary::ApproverSummary;
pub use summary::TargetBreakdown;
pub use time::Timestamp;
