// crates/gatekeeper-cli/src/main.rs
// ============================================================================
// Module: Gatekeeper CLI Entry Point
// Description: Offline precheck and full gate runs against a publish packet
// file.
// Purpose: Reference command-line front end over the gate state machine.
// Dependencies: clap, gatekeeper-core, gatekeeper-governance-client, tokio
// ============================================================================

//! ## Overview
//! `marketops` drives [`gatekeeper_core::GateStateMachine`] against a
//! `PublishPacket` read from disk. `precheck` never contacts a Governance
//! SDK; `gate` runs the full six-stage sequence against either an in-memory
//! reference SDK (the default, for offline/dry runs) or a live endpoint
//! named by `--control-url`. Exit codes follow §7/§8: `0` allowed, `1`
//! Precheck/Decision denial, `2` a fail-closed denial at Hash/Execution/
//! EvidencePack/Verify, `3` a CLI-level error (bad input, I/O failure).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use gatekeeper_core::ArtifactSink;
use gatekeeper_core::FailureStage;
use gatekeeper_core::FileArtifactSink;
use gatekeeper_core::GateConfig;
use gatekeeper_core::GateResult;
use gatekeeper_core::GateStateMachine;
use gatekeeper_core::GovernanceSdk;
use gatekeeper_core::PublishPacket;
use gatekeeper_governance_client::HttpGovernanceClient;
use gatekeeper_governance_client::InMemoryGovernanceSdk;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Reference CLI over the `gatekeeper-core` gate state machine.
#[derive(Parser, Debug)]
#[command(name = "marketops", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    command: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs only the structural/tenant/actor/destination checks, without
    /// contacting a Governance SDK.
    Precheck(GateArgs),
    /// Runs the full Precheck -> Hash -> Decision -> Execution ->
    /// EvidencePack -> Verify sequence.
    Gate(GateArgs),
}

/// Arguments shared by `precheck` and `gate`.
#[derive(Args, Debug)]
struct GateArgs {
    /// Path to a JSON-encoded `PublishPacket`.
    #[arg(long, value_name = "PATH")]
    packet: PathBuf,
    /// Write the `GateResult` JSON here instead of stdout.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Pretty-print the `GateResult` JSON.
    #[arg(long)]
    pretty: bool,
    /// Live Governance SDK endpoint to run `gate` against. When absent,
    /// `gate` runs against a deterministic in-memory reference SDK that
    /// approves every decision, matching the dry-run/offline posture
    /// documented for this CLI.
    #[arg(long, value_name = "URL")]
    control_url: Option<String>,
    /// Root directory the decision receipt (and evidence pack, when the
    /// backend supports download) is written under. Without this, `gate`
    /// still calls evidence.create/download but materializes nothing on
    /// disk.
    #[arg(long, value_name = "DIR")]
    audit_root: Option<PathBuf>,
    /// Reserved for a future Proof Pack signature check against a trusted
    /// Ed25519 public key; not read by `precheck`/`gate`, which never build
    /// or verify a Proof Pack themselves.
    #[arg(long, value_name = "PATH")]
    #[allow(dead_code, reason = "accepted for forward compatibility with a future proofpack-verify subcommand, unused by precheck/gate")]
    public_key: Option<PathBuf>,
    /// Reserved for a future multi-key trust bundle check; see `public_key`.
    #[arg(long, value_name = "PATH")]
    #[allow(dead_code, reason = "accepted for forward compatibility with a future proofpack-verify subcommand, unused by precheck/gate")]
    trust_bundle: Option<PathBuf>,
    /// Requests bound execution (stage 4) after an approved decision.
    #[arg(long)]
    execute: bool,
}

/// Default execution target label used when `--execute` is passed without
/// a more specific target selection mechanism.
const DEFAULT_EXECUTION_TARGET: &str = "keon-execute-default";

/// Governance tool-invocation operation label attached by this CLI.
const CLI_OPERATION: &str = "marketops.cli.publish";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI-level error wrapper, distinct from a denied [`GateResult`].
#[derive(Debug, Error)]
enum CliError {
    /// The packet file could not be read.
    #[error("failed to read packet file {path}: {source}")]
    ReadPacket {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The packet file was not valid `PublishPacket` JSON.
    #[error("failed to parse packet file {path}: {source}")]
    ParsePacket {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The `GateResult` could not be serialized.
    #[error("failed to serialize gate result: {0}")]
    SerializeResult(#[source] serde_json::Error),
    /// The `GateResult` could not be written to its destination.
    #[error("failed to write output {path}: {source}")]
    WriteOutput {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// `--control-url` was not a usable HTTP Governance SDK endpoint.
    #[error("invalid --control-url: {0}")]
    ControlUrl(#[from] gatekeeper_governance_client::HttpGovernanceClientError),
}

/// CLI result alias.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            let _ = write_stderr_line(&err.to_string());
            ExitCode::from(3)
        },
    }
}

/// Dispatches to the selected subcommand.
async fn run(command: Commands) -> CliResult<ExitCode> {
    match command {
        Commands::Precheck(args) => command_precheck(args),
        Commands::Gate(args) => command_gate(args).await,
    }
}

// ============================================================================
// SECTION: Precheck
// ============================================================================

/// Executes `marketops precheck`: structural/tenant/actor/destination checks
/// only, no Governance SDK contact.
fn command_precheck(args: GateArgs) -> CliResult<ExitCode> {
    let packet = read_packet(&args.packet)?;
    let config = config_from_packet(&packet, args.execute);
    let sdk = InMemoryGovernanceSdk::new();
    let gate = GateStateMachine::new(config, &sdk);

    let result = gate.precheck(&packet).unwrap_or_else(|| {
        GateResult::allow(packet.clone(), String::new(), gatekeeper_core::GovernanceEvidence {
            receipt_id: String::new(),
            outcome: "precheck-only".to_owned(),
            decided_at_utc: gatekeeper_core::Timestamp::now(),
            receipt_path: None,
            evidence_pack_path: None,
            verification_summary: Some("precheck passed; no decision was requested".to_owned()),
        })
    });

    emit_result(&result, &args)?;
    Ok(exit_code_for(&result))
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Executes `marketops gate`: the full six-stage sequence.
async fn command_gate(args: GateArgs) -> CliResult<ExitCode> {
    let packet = read_packet(&args.packet)?;
    let config = config_from_packet(&packet, args.execute);
    let cancellation = CancellationToken::new();

    let audit_sink = args.audit_root.as_ref().map(FileArtifactSink::new);

    let result = if let Some(control_url) = &args.control_url {
        let sdk = HttpGovernanceClient::new(control_url.clone())?;
        run_gate(&config, &sdk, packet, audit_sink.as_ref(), &cancellation).await
    } else {
        let sdk = InMemoryGovernanceSdk::new();
        run_gate(&config, &sdk, packet, audit_sink.as_ref(), &cancellation).await
    };

    emit_result(&result, &args)?;
    Ok(exit_code_for(&result))
}

/// Builds a gate bound to `sdk` and runs it, attaching `audit_sink` when
/// present.
async fn run_gate(config: &GateConfig, sdk: &dyn GovernanceSdk, packet: PublishPacket, audit_sink: Option<&FileArtifactSink>, cancellation: &CancellationToken) -> GateResult {
    let gate = GateStateMachine::new(config.clone(), sdk);
    let gate = match audit_sink {
        Some(sink) => gate.with_audit_sink(sink as &dyn ArtifactSink),
        None => gate,
    };
    gate.run(packet, cancellation).await
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Reads and parses a `PublishPacket` from `path`.
fn read_packet(path: &PathBuf) -> CliResult<PublishPacket> {
    let bytes = fs::read(path).map_err(|source| CliError::ReadPacket {
        path: path.clone(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| CliError::ParsePacket {
        path: path.clone(),
        source,
    })
}

/// Derives a [`GateConfig`] scoped to the packet's own tenant, actor, and
/// destinations. This CLI has no separate identity/allowlist configuration
/// surface (unlike `gatekeeper-http`, which is deployed per-tenant), so the
/// packet under test is trusted to declare the tenant/actor/destination set
/// it expects the gate to accept; the gate still independently denies any
/// packet whose structure violates §4.9 invariants.
fn config_from_packet(packet: &PublishPacket, execute: bool) -> GateConfig {
    GateConfig {
        tenant_id: packet.tenant_id.clone(),
        actor_id: packet.actor_id.clone(),
        allowed_destinations: packet.destinations.iter().map(ToString::to_string).collect(),
        operation: CLI_OPERATION.to_owned(),
        execution_target: execute.then(|| DEFAULT_EXECUTION_TARGET.to_owned()),
    }
}

/// Writes the `GateResult` JSON to `--out` or stdout.
fn emit_result(result: &GateResult, args: &GateArgs) -> CliResult<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    }
    .map_err(CliError::SerializeResult)?;

    match &args.out {
        Some(path) => {
            fs::write(path, format!("{json}\n")).map_err(|source| CliError::WriteOutput {
                path: path.clone(),
                source,
            })?;
        },
        None => write_stdout_line(&json).map_err(|source| CliError::WriteOutput {
            path: PathBuf::from("-"),
            source,
        })?,
    }
    Ok(())
}

/// Maps a `GateResult` to the documented CLI exit code.
fn exit_code_for(result: &GateResult) -> ExitCode {
    if result.allowed {
        return ExitCode::SUCCESS;
    }
    match result.failure_stage {
        Some(FailureStage::Precheck | FailureStage::Decision) => ExitCode::from(1),
        _ => ExitCode::from(2),
    }
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}
