// crates/gatekeeper-core/src/core/summary.rs
// ============================================================================
// Module: Gatekeeper Approver Summary
// Description: Derived human-facing summary of a run's plan and policy verdict.
// Purpose: Give an approver a status breakdown without reading raw artifacts.
// Dependencies: crate::core::{identifiers, plan_ledger, run}, serde
// ============================================================================

//! ## Overview
//! `ApproverSummary` is derived, never authoritative: it is computed from the
//! plan and ledger and re-renders as Markdown. Tests should compare the JSON
//! form only, per §4.8; the Markdown renderer is a pure function of the same
//! data and carries no independent state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;
use crate::core::identifiers::TenantId;
use crate::core::plan_ledger::PublicationPlan;
use crate::core::run::Mode;

// ============================================================================
// SECTION: Approver Summary
// ============================================================================

/// Per-target shipment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetBreakdown {
    /// The candidate or target label.
    pub target: String,
    /// `"would_ship"` or `"would_not_ship"`.
    pub status: String,
}

/// A derived, human-facing summary of a run's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproverSummary {
    /// The run this summary describes.
    pub run_id: RunId,
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Execution mode.
    pub mode: Mode,
    /// Overall status: `"approved"` or `"blocked"`.
    pub status: String,
    /// Count of candidates that would ship.
    pub would_ship_count: usize,
    /// Count of candidates that would not ship.
    pub would_not_ship_count: usize,
    /// Issue counts by type, e.g. `{"missing_codeowners": 2}`.
    pub issue_counts_by_type: BTreeMap<String, usize>,
    /// Per-target shipment breakdown, in plan order.
    pub target_breakdown: Vec<TargetBreakdown>,
    /// `"approved"` or the first policy denial reason id, if blocked.
    pub policy_verdict: String,
}

impl ApproverSummary {
    /// Derives a summary from a plan and an issue-count map gathered during
    /// the Discover stage.
    #[must_use]
    pub fn derive(plan: &PublicationPlan, issue_counts_by_type: BTreeMap<String, usize>, policy_verdict: &str) -> Self {
        let status = if plan.would_not_ship.is_empty() { "approved" } else { "blocked" };
        let mut target_breakdown = Vec::with_capacity(plan.would_ship.len() + plan.would_not_ship.len());
        target_breakdown.extend(plan.would_ship.iter().map(|target| TargetBreakdown {
            target: target.clone(),
            status: "would_ship".to_owned(),
        }));
        target_breakdown.extend(plan.would_not_ship.iter().map(|target| TargetBreakdown {
            target: target.clone(),
            status: "would_not_ship".to_owned(),
        }));
        Self {
            run_id: plan.run_id,
            tenant_id: plan.tenant_id.clone(),
            mode: plan.mode,
            status: status.to_owned(),
            would_ship_count: plan.would_ship.len(),
            would_not_ship_count: plan.would_not_ship.len(),
            issue_counts_by_type,
            target_breakdown,
            policy_verdict: policy_verdict.to_owned(),
        }
    }

    /// Renders this summary as Markdown. A pure function of `self`; carries
    /// no information not already present in the JSON form.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Approver Summary: {}", self.run_id);
        let _ = writeln!(out, "\n- Tenant: `{}`", self.tenant_id);
        let _ = writeln!(out, "- Status: **{}**", self.status);
        let _ = writeln!(out, "- Policy verdict: {}", self.policy_verdict);
        let _ = writeln!(out, "- Would ship: {}", self.would_ship_count);
        let _ = writeln!(out, "- Would not ship: {}", self.would_not_ship_count);
        if !self.issue_counts_by_type.is_empty() {
            out.push_str("\n## Issues\n\n");
            for (issue, count) in &self.issue_counts_by_type {
                let _ = writeln!(out, "- {issue}: {count}");
            }
        }
        out.push_str("\n## Targets\n\n");
        for entry in &self.target_breakdown {
            let _ = writeln!(out, "- `{}` — {}", entry.target, entry.status);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_marks_blocked_when_anything_would_not_ship() {
        let plan = PublicationPlan::all_blocked(
            RunId::generate(),
            TenantId::new("keon-public"),
            Mode::DryRun,
            vec!["repo-a".to_owned()],
            &["direct push to main denied".to_owned()],
        );
        let summary = ApproverSummary::derive(&plan, BTreeMap::new(), "policy.direct_push_main.denied.v1");
        assert_eq!(summary.status, "blocked");
        assert_eq!(summary.would_not_ship_count, 1);
    }

    #[test]
    fn markdown_mentions_status_and_targets() {
        let plan = PublicationPlan::all_ship(RunId::generate(), TenantId::new("t"), Mode::DryRun, vec!["repo-a".to_owned()]);
        let summary = ApproverSummary::derive(&plan, BTreeMap::new(), "approved");
        let markdown = summary.to_markdown();
        assert!(markdown.contains("**approved**"));
        assert!(markdown.contains("repo-a"));
    }
}
