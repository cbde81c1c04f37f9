// crates/gatekeeper-governance-client/src/lib.rs
// ============================================================================
// Module: Gatekeeper Governance Client
// Description: Concrete GovernanceSdk backends.
// Purpose: Provide an HTTP client against the Omega Governance SDK and an
// in-memory reference implementation for tests and local runs.
// Dependencies: gatekeeper-core, reqwest
// ============================================================================

//! ## Overview
//! `gatekeeper-core` depends only on the [`gatekeeper_core::GovernanceSdk`]
//! trait; this crate supplies the two concrete backends a deployment
//! chooses between. [`HttpGovernanceClient`] calls a live Omega Governance
//! SDK endpoint over HTTP. [`InMemoryGovernanceSdk`] holds no network
//! dependency at all and is the backend `system-tests` and the CLI's
//! offline mode drive the gate against.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http_client;
pub mod in_memory;

pub use http_client::HttpGovernanceClient;
pub use http_client::HttpGovernanceClientError;
pub use in_memory::DecisionRule;
pub use in_memory::InMemoryGovernanceSdk;
