// crates/gatekeeper-http/src/lib.rs
// ============================================================================
// Module: Gatekeeper HTTP
// Description: Axum router construction over the dual-mode pipeline and
// Proof Pack sealing.
// Purpose: Expose the `/marketops` and `/health` surfaces documented for the
// publish gate's HTTP transport.
// Dependencies: axum, gatekeeper-core
// ============================================================================

//! ## Overview
//! This crate is a thin transport layer. Every route handler in
//! [`routes`] marshals a request into a `gatekeeper-core` call and
//! serializes the result; no decision or sealing logic lives here. See
//! [`build_router`] for the full route table.

pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use axum::routing::post;

pub use state::AppState;

/// Builds the full Axum router over `state`.
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/marketops/runs", post(routes::create_run))
        .route("/marketops/runs/{id}", get(routes::get_run))
        .route("/marketops/runs/{id}/plan", get(routes::get_plan))
        .route("/marketops/runs/{id}/ledger", get(routes::get_ledger))
        .route("/marketops/runs/{id}/advisory", get(routes::get_advisory))
        .route("/marketops/runs/{id}/summary", get(routes::get_summary))
        .route("/marketops/runs/{id}/summary.md", get(routes::get_summary_markdown))
        .route("/marketops/proofpack", post(routes::post_proofpack))
        .with_state(state)
}
