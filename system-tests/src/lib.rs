// system-tests/src/lib.rs
// ============================================================================
// Module: Gatekeeper System Tests Library
// Description: Placeholder library target for the system-tests package.
// Purpose: Let `tests/*.rs` depend on the package's own Cargo.toml features
// without requiring any shared runtime code.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Every scenario in this package drives `gatekeeper-core` and
//! `gatekeeper-governance-client` directly; there is no shared runtime
//! surface worth a library module. Fixtures common to more than one scenario
//! live under `tests/helpers`, included per test binary via `#[path]`.
