// crates/gatekeeper-http/src/routes.rs
// ============================================================================
// Module: Gatekeeper HTTP Routes
// Description: Axum handlers for the run/plan/ledger/advisory/summary and
// Proof Pack endpoints.
// Purpose: Marshal requests into pipeline/Proof Pack calls and responses
// back into canonical JSON.
// Dependencies: axum, gatekeeper-core
// ============================================================================

//! ## Overview
//! Every handler is a thin wrapper: build a typed request, call into
//! `gatekeeper-core`, serialize the result as canonical JSON (not Axum's
//! default compact form) so a byte-for-byte comparison against a sealed
//! Proof Pack artifact is meaningful. Malformed requests return `400` with
//! `{"error": "..."}`; unknown runs return `404` the same way.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use gatekeeper_core::CompletedRun;
use gatekeeper_core::CorrelationId;
use gatekeeper_core::FileArtifactSink;
use gatekeeper_core::LivePort;
use gatekeeper_core::Mode;
use gatekeeper_core::NullSinkPort;
use gatekeeper_core::PipelineOrchestrator;
use gatekeeper_core::ProofPackBuilder;
use gatekeeper_core::RunId;
use gatekeeper_core::TenantId;
use gatekeeper_core::canonicalize;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use uuid::Uuid;

use crate::state::AppState;
use crate::state::RunRecord;

/// Default scenario label for a run not yet named at seal time.
const DEFAULT_SCENARIO: &str = "default";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// A handler-level failure, mapped to an HTTP status and a `{error}` body.
pub enum ApiError {
    /// The request body or a path parameter was malformed.
    BadRequest(String),
    /// The referenced run or artifact does not exist.
    NotFound(String),
    /// Building or sealing a Proof Pack failed.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Wraps already-canonicalized JSON bytes so they are served byte-stable,
/// matching the bytes a sealed Proof Pack artifact would contain.
pub struct CanonicalJson(pub Vec<u8>);

impl IntoResponse for CanonicalJson {
    fn into_response(self) -> Response {
        ([(axum::http::header::CONTENT_TYPE, "application/json")], self.0).into_response()
    }
}

/// Serializes `value` as canonical JSON, mapping failures to a `500`.
fn canonical_response<T: Serialize>(value: &T) -> Result<CanonicalJson, ApiError> {
    canonicalize(value).map(CanonicalJson).map_err(|err| ApiError::Internal(err.to_string()))
}

/// Parses a path parameter as a [`RunId`], mapping failures to a `400`.
fn parse_run_id(raw: &str) -> Result<RunId, ApiError> {
    Uuid::parse_str(raw).map(RunId::from_uuid).map_err(|_| ApiError::BadRequest(format!("{raw} is not a valid run id")))
}

// ============================================================================
// SECTION: POST /marketops/runs
// ============================================================================

/// Request body for `POST /marketops/runs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRunRequest {
    /// Execution mode; defaults to `dry_run` when omitted.
    #[serde(default)]
    pub mode: Option<RequestMode>,
    /// Tenant identifier; defaults to an empty tenant when omitted.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Opaque run input.
    #[serde(default)]
    pub input: Option<Map<String, Value>>,
    /// Caller-supplied correlation identifier.
    #[serde(default)]
    pub correlation_id: Option<String>,
}

/// The wire spelling of [`Mode`], matching §6's `"dry_run"`/`"prod"` literals.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// `"dry_run"`.
    DryRun,
    /// `"prod"`.
    Prod,
}

impl From<RequestMode> for Mode {
    fn from(value: RequestMode) -> Self {
        match value {
            RequestMode::DryRun => Self::DryRun,
            RequestMode::Prod => Self::Prod,
        }
    }
}

impl From<Mode> for RequestMode {
    fn from(value: Mode) -> Self {
        match value {
            Mode::DryRun => Self::DryRun,
            Mode::Prod => Self::Prod,
        }
    }
}

/// Response body for `POST /marketops/runs`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRunResponse {
    /// The newly minted run identifier.
    run_id: RunId,
    /// The mode the run was started with.
    mode: RequestMode,
    /// Always `"started"`; the run has fully completed by the time this
    /// response is returned.
    status: &'static str,
}

/// `POST /marketops/runs` — starts and fully drives one pipeline run.
pub async fn create_run(State(state): State<Arc<AppState>>, Json(request): Json<CreateRunRequest>) -> Result<Json<CreateRunResponse>, ApiError> {
    let mode: Mode = request.mode.unwrap_or(RequestMode::DryRun).into();
    let tenant_id = TenantId::new(request.tenant_id.unwrap_or_default());
    let correlation_id = request.correlation_id.map(CorrelationId::new);
    let input = request.input.unwrap_or_default();

    let run = gatekeeper_core::MarketOpsRun::start(tenant_id.clone(), mode, input, correlation_id);
    let orchestrator = PipelineOrchestrator::new(&gatekeeper_core::NullEmitter, &state.fc_signer);

    let result = match mode {
        Mode::DryRun => {
            let port = NullSinkPort::new(&state.intent_store);
            orchestrator.run(&run, &port, &state.intent_store).await
        }
        Mode::Prod => {
            let port = LivePort::new(state.authorization.as_ref());
            orchestrator.run(&run, &port, &state.intent_store).await
        }
    };

    let record = RunRecord {
        tenant_id,
        mode,
        scenario: DEFAULT_SCENARIO.to_owned(),
        success: result.success,
        plan: result.plan,
        ledger: result.ledger,
        advisory_receipt: result.advisory_receipt,
        summary: result.summary,
    };
    state.runs.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(run.run_id, record);

    Ok(Json(CreateRunResponse {
        run_id: run.run_id,
        mode: mode.into(),
        status: "started",
    }))
}

// ============================================================================
// SECTION: GET /marketops/runs/{id}
// ============================================================================

/// Response body for `GET /marketops/runs/{id}`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummaryResponse {
    /// The run identifier.
    run_id: RunId,
    /// The tenant this run belongs to.
    tenant_id: String,
    /// The mode the run was started with.
    mode: RequestMode,
    /// `"completed"` once Seal has run successfully, `"failed"` otherwise.
    status: &'static str,
}

/// `GET /marketops/runs/{id}` — a short run status summary.
pub async fn get_run(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<RunSummaryResponse>, ApiError> {
    let run_id = parse_run_id(&id)?;
    let runs = state.runs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let record = runs.get(&run_id).ok_or_else(|| ApiError::NotFound(format!("unknown run {id}")))?;
    Ok(Json(RunSummaryResponse {
        run_id,
        tenant_id: record.tenant_id.as_str().to_owned(),
        mode: record.mode.into(),
        status: if record.success { "completed" } else { "failed" },
    }))
}

// ============================================================================
// SECTION: GET /marketops/runs/{id}/{plan,ledger,advisory,summary}
// ============================================================================

/// `GET /marketops/runs/{id}/plan` — the publication plan as canonical JSON.
pub async fn get_plan(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<CanonicalJson, ApiError> {
    let run_id = parse_run_id(&id)?;
    let runs = state.runs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let record = runs.get(&run_id).ok_or_else(|| ApiError::NotFound(format!("unknown run {id}")))?;
    let plan = record.plan.as_ref().ok_or_else(|| ApiError::NotFound("plan not yet available for this run".to_owned()))?;
    canonical_response(plan)
}

/// `GET /marketops/runs/{id}/ledger` — the sealed ledger as canonical JSON.
pub async fn get_ledger(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<CanonicalJson, ApiError> {
    let run_id = parse_run_id(&id)?;
    let runs = state.runs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let record = runs.get(&run_id).ok_or_else(|| ApiError::NotFound(format!("unknown run {id}")))?;
    let ledger = record.ledger.as_ref().ok_or_else(|| ApiError::NotFound("ledger not yet available for this run".to_owned()))?;
    canonical_response(ledger)
}

/// `GET /marketops/runs/{id}/advisory` — the signed advisory receipt, when
/// present (dry-run only).
pub async fn get_advisory(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<CanonicalJson, ApiError> {
    let run_id = parse_run_id(&id)?;
    let runs = state.runs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let record = runs.get(&run_id).ok_or_else(|| ApiError::NotFound(format!("unknown run {id}")))?;
    let advisory = record.advisory_receipt.as_ref().ok_or_else(|| ApiError::NotFound("no advisory receipt for this run".to_owned()))?;
    canonical_response(advisory)
}

/// `GET /marketops/runs/{id}/summary` — the `ApproverSummary` as canonical
/// JSON.
pub async fn get_summary(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<CanonicalJson, ApiError> {
    let run_id = parse_run_id(&id)?;
    let runs = state.runs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let record = runs.get(&run_id).ok_or_else(|| ApiError::NotFound(format!("unknown run {id}")))?;
    let summary = record.summary.as_ref().ok_or_else(|| ApiError::NotFound("summary not yet available for this run".to_owned()))?;
    canonical_response(summary)
}

/// `GET /marketops/runs/{id}/summary.md` — the same summary, rendered as
/// Markdown.
pub async fn get_summary_markdown(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let run_id = parse_run_id(&id)?;
    let runs = state.runs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let record = runs.get(&run_id).ok_or_else(|| ApiError::NotFound(format!("unknown run {id}")))?;
    let summary = record.summary.as_ref().ok_or_else(|| ApiError::NotFound("summary not yet available for this run".to_owned()))?;
    Ok(([(axum::http::header::CONTENT_TYPE, "text/markdown; charset=utf-8")], summary.to_markdown()).into_response())
}

// ============================================================================
// SECTION: POST /marketops/proofpack
// ============================================================================

/// Request body for `POST /marketops/proofpack`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPackRequest {
    /// Which already-completed runs to include.
    pub run_ids: Vec<String>,
    /// Scenario label per run id; runs not listed get [`DEFAULT_SCENARIO`].
    #[serde(default)]
    pub scenarios: std::collections::BTreeMap<String, String>,
}

/// `POST /marketops/proofpack` — seals the named runs into a Proof Pack on
/// disk and returns the resulting `PackIndex`.
pub async fn post_proofpack(State(state): State<Arc<AppState>>, Json(request): Json<ProofPackRequest>) -> Result<CanonicalJson, ApiError> {
    if request.run_ids.is_empty() {
        return Err(ApiError::BadRequest("runIds must not be empty".to_owned()));
    }

    let runs = state.runs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let mut completed = Vec::with_capacity(request.run_ids.len());
    for raw_id in &request.run_ids {
        let run_id = parse_run_id(raw_id)?;
        let record = runs.get(&run_id).ok_or_else(|| ApiError::NotFound(format!("unknown run {raw_id}")))?;
        let plan = record.plan.clone().ok_or_else(|| ApiError::BadRequest(format!("run {raw_id} has no plan to seal")))?;
        let ledger = record.ledger.clone().ok_or_else(|| ApiError::BadRequest(format!("run {raw_id} has no ledger to seal")))?;
        let summary = record.summary.clone().ok_or_else(|| ApiError::BadRequest(format!("run {raw_id} has no summary to seal")))?;
        let scenario = request.scenarios.get(raw_id).cloned().unwrap_or_else(|| DEFAULT_SCENARIO.to_owned());
        completed.push(CompletedRun {
            run_id,
            scenario,
            tenant_id: record.tenant_id.clone(),
            plan,
            ledger,
            advisory_receipt: record.advisory_receipt.clone(),
            summary,
        });
    }
    drop(runs);

    let sink = FileArtifactSink::new(state.proofpack_root.clone());
    let pack_id = format!("pack-{}", Uuid::new_v4());
    let mut builder = ProofPackBuilder::new(&state.ed25519_signer, &sink, pack_id);
    for run in &completed {
        builder.add_run(run).map_err(|err| ApiError::Internal(err.to_string()))?;
    }
    let index = builder.seal().map_err(|err| ApiError::Internal(err.to_string()))?;
    canonical_response(&index)
}

// ============================================================================
// SECTION: GET /health
// ============================================================================

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"healthy"`; the process would not be serving otherwise.
    status: &'static str,
    /// The port this server is bound to.
    port: u16,
}

/// `GET /health` — a liveness probe.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        port: state.port,
    })
}
