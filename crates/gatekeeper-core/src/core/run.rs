// crates/gatekeeper-core/src/core/run.rs
// ============================================================================
// Module: Gatekeeper MarketOps Run
// Description: A single dual-mode pipeline execution.
// Purpose: Carry the mode, tenant, and opaque input a run is scoped to.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! A `MarketOpsRun` is created once per pipeline invocation. `mode` is
//! mandatory: callers that omit it fail closed rather than defaulting
//! silently, matching the HTTP-layer default documented at the transport
//! boundary (not here — this type itself never defaults).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CorrelationId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Mode
// ============================================================================

/// Execution mode: whether the side-effect port is allowed to mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// No external side effects are performed; every intent is blocked.
    DryRun,
    /// External side effects are performed through the live port.
    Prod,
}

// ============================================================================
// SECTION: MarketOps Run
// ============================================================================

/// One end-to-end pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOpsRun {
    /// Run identifier.
    pub run_id: RunId,
    /// Tenant identifier this run is scoped to.
    pub tenant_id: TenantId,
    /// Execution mode.
    pub mode: Mode,
    /// When the run started.
    pub started_at: Timestamp,
    /// Opaque run input, e.g. `{"repos": [...]}`.
    pub input: serde_json::Map<String, serde_json::Value>,
    /// Optional correlation identifier propagated from the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
}

impl MarketOpsRun {
    /// Starts a fresh run with a freshly generated [`RunId`].
    #[must_use]
    pub fn start(
        tenant_id: TenantId,
        mode: Mode,
        input: serde_json::Map<String, serde_json::Value>,
        correlation_id: Option<CorrelationId>,
    ) -> Self {
        Self {
            run_id: RunId::generate(),
            tenant_id,
            mode,
            started_at: Timestamp::now(),
            input,
            correlation_id,
        }
    }

    /// Reads `input.repos` as an ordered list of repository paths, accepting
    /// a single string, an array of strings, or a JSON array value.
    #[must_use]
    pub fn input_repos(&self) -> Vec<String> {
        match self.input.get("repos") {
            Some(serde_json::Value::String(single)) => vec![single.clone()],
            Some(serde_json::Value::Array(items)) => {
                items.iter().filter_map(|item| item.as_str().map(ToOwned::to_owned)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Reads `input.simulateViolation` as an optional string flag.
    #[must_use]
    pub fn simulate_violation(&self) -> Option<&str> {
        self.input.get("simulateViolation").and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_repos_accepts_single_string() {
        let mut input = serde_json::Map::new();
        input.insert("repos".to_owned(), serde_json::json!("/tmp/repo-a"));
        let run = MarketOpsRun::start(TenantId::new("t"), Mode::DryRun, input, None);
        assert_eq!(run.input_repos(), vec!["/tmp/repo-a".to_owned()]);
    }

    #[test]
    fn input_repos_accepts_array() {
        let mut input = serde_json::Map::new();
        input.insert("repos".to_owned(), serde_json::json!(["/tmp/a", "/tmp/b"]));
        let run = MarketOpsRun::start(TenantId::new("t"), Mode::Prod, input, None);
        assert_eq!(run.input_repos(), vec!["/tmp/a".to_owned(), "/tmp/b".to_owned()]);
    }

    #[test]
    fn simulate_violation_reads_flag() {
        let mut input = serde_json::Map::new();
        input.insert("simulateViolation".to_owned(), serde_json::json!("direct_push_main"));
        let run = MarketOpsRun::start(TenantId::new("t"), Mode::DryRun, input, None);
        assert_eq!(run.simulate_violation(), Some("direct_push_main"));
    }
}
