// crates/gatekeeper-http/src/bin/gatekeeper-http.rs
// ============================================================================
// Module: Gatekeeper HTTP Server Entry Point
// Description: Loads configuration from the environment and serves the
// dual-mode pipeline HTTP surface.
// Purpose: Standalone binary for the `gatekeeper-http` crate.
// Dependencies: gatekeeper-config, gatekeeper-http, tokio
// ============================================================================

#![allow(clippy::print_stderr, reason = "startup diagnostics have no logging sink wired up yet")]

use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use gatekeeper_config::GatekeeperConfig;
use gatekeeper_core::Ed25519Signer;
use gatekeeper_core::FcSigner;
use gatekeeper_http::AppState;
use gatekeeper_http::build_router;
use gatekeeper_http::state::DenyAllValidator;
use thiserror::Error;

/// Fallback HMAC key used only when `MARKETOPS_FC_HMAC_KEY` is unset, so the
/// server can still start in a dry-run-only local environment. Any run
/// requiring a real signature should configure a real key.
const DEV_FC_HMAC_KEY: &[u8] = b"gatekeeper-http-dev-key-do-not-use-in-prod";

/// Errors that can abort startup or serving.
#[derive(Debug, Error)]
enum ServeError {
    /// Environment configuration was missing or malformed.
    #[error("config error: {0}")]
    Config(#[from] gatekeeper_config::ConfigError),
    /// The fail-closed advisory signer could not be built.
    #[error("failed to build fc signer: {0}")]
    FcSigner(#[from] gatekeeper_core::FcSignerError),
    /// The Proof Pack signing key could not be loaded or generated.
    #[error("failed to load ed25519 key: {0}")]
    Ed25519Signer(#[from] gatekeeper_core::Ed25519SignerError),
    /// The configured port could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The server stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("gatekeeper-http: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration, builds application state, and serves until
/// Ctrl+C.
async fn run() -> Result<(), ServeError> {
    let config = GatekeeperConfig::from_env()?;

    let hmac_bytes = config.fc_hmac_key.as_deref().map_or_else(|| DEV_FC_HMAC_KEY.to_vec(), |key| key.as_bytes().to_vec());
    let fc_signer = FcSigner::new("gatekeeper-http-fc-key", hmac_bytes)?;
    let ed25519_signer = match &config.ed25519_private_key_path {
        Some(path) => Ed25519Signer::load_or_generate(path, true)?,
        None => Ed25519Signer::generate(),
    };

    let proofpack_root = PathBuf::from(std::env::var("MARKETOPS_PROOFPACK_ROOT").unwrap_or_else(|_| "./proofpacks".to_owned()));

    let state = AppState::new(fc_signer, ed25519_signer, Box::new(DenyAllValidator), proofpack_root, config.port);
    let router = build_router(std::sync::Arc::new(state));

    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), config.port);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|source| ServeError::Bind {
        addr,
        source,
    })?;
    eprintln!("gatekeeper-http listening on {addr}");
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await.map_err(ServeError::Serve)
}

/// Waits for Ctrl+C so the server drains in-flight requests before exiting.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
