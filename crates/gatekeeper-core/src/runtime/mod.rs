// crates/gatekeeper-core/src/runtime/mod.rs
// ============================================================================
// Module: Gatekeeper Runtime
// Description: Wires the policy evaluator, side-effect port, and pipeline
// stages that together drive a dual-mode run.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

pub mod audit_writer;
pub mod gate;
pub mod orchestrator;
pub mod pipeline_stages;
pub mod policy;
pub mod proofpack_builder;
pub mod proofpack_verifier;
pub mod side_effect_port;

pub use gate::ExecutionRequest;
pub use gate::GateConfig;
pub use gate::GateStateMachine;
pub use orchestrator::PipelineOrchestrator;
pub use orchestrator::PipelineResult;
pub use policy::CI_WEAKEN_REASON;
pub use policy::DIRECT_PUSH_MAIN_REASON;
pub use policy::IntentVerdict;
pub use policy::PolicyEvaluation;
pub use policy::evaluate_policy;
pub use proofpack_builder::CompletedRun;
pub use proofpack_builder::ProofPackBuilder;
pub use proofpack_builder::ProofPackBuilderError;
pub use proofpack_verifier::CheckFailure;
pub use proofpack_verifier::ProofPackVerifier;
pub use proofpack_verifier::VerificationReport;

pub use side_effect_port::IntentStore;
pub use side_effect_port::LivePort;
pub use side_effect_port::NullSinkPort;
pub use side_effect_port::SideEffectPort;
pub use side_effect_port::SideEffectPortError;
pub use side_effect_port::SideEffectRequest;
