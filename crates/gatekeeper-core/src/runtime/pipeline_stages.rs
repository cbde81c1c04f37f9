// crates/gatekeeper-core/src/runtime/pipeline_stages.rs
// ============================================================================
// Module: Gatekeeper Pipeline Stages
// Description: Discover/Select/Verify/Evaluate/Plan, each a pure async fn.
// Purpose: Implement the fixed stage sequence the orchestrator drives.
// Dependencies: crate::{core, runtime::policy}, tokio
// ============================================================================

//! ## Overview
//! Each stage takes the run plus the prior stage's output and returns the
//! next. None of these stages performs a side effect; intent recording
//! happens only at the Execute boundary inside the orchestrator, per the
//! open question this protocol resolves in favor of the port as the sole
//! recording boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::IntentId;
use crate::core::MarketOpsRun;
use crate::core::RequiredAuthorization;
use crate::core::RunId;
use crate::core::SideEffectIntent;
use crate::core::SideEffectKind;
use crate::core::SideEffectTarget;
use crate::core::Timestamp;
use crate::runtime::policy::PolicyEvaluation;
use crate::runtime::policy::evaluate_policy;

// ============================================================================
// SECTION: Discover
// ============================================================================

/// Severity of a hygiene issue found during Discover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Low-severity issue.
    Low,
    /// Medium-severity issue.
    Medium,
    /// High-severity issue.
    High,
}

/// One hygiene issue found for a discovered artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HygieneIssue {
    /// Stable issue type, e.g. `"missing_codeowners"`.
    pub issue_type: String,
    /// Severity of the issue.
    pub severity: IssueSeverity,
}

/// One candidate artifact discovered from `run.input.repos`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredArtifact {
    /// The repository path this artifact was discovered at.
    pub repo_path: String,
    /// Hygiene issues found for this candidate.
    pub issues: Vec<HygieneIssue>,
}

const REQUIRED_README_SECTIONS: [&str; 3] = ["## Installation", "## Usage", "## License"];

/// Scans `run.input.repos`, applying the three hygiene checks to each
/// existing directory. Missing directories are skipped silently (the caller
/// is expected to audit-log the skip; this function has no logging side
/// channel of its own).
pub async fn discover(run: &MarketOpsRun) -> Vec<DiscoveredArtifact> {
    let mut artifacts = Vec::new();
    for repo_path in run.input_repos() {
        let path = std::path::Path::new(&repo_path);
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            continue;
        }
        let mut issues = Vec::new();
        if let Some(issue) = readme_issue(path).await {
            issues.push(issue);
        }
        if !tokio::fs::try_exists(path.join("CODEOWNERS")).await.unwrap_or(false) {
            issues.push(HygieneIssue {
                issue_type: "missing_codeowners".to_owned(),
                severity: IssueSeverity::High,
            });
        }
        if !tokio::fs::try_exists(path.join(".editorconfig")).await.unwrap_or(false) {
            issues.push(HygieneIssue {
                issue_type: "missing_editorconfig".to_owned(),
                severity: IssueSeverity::Low,
            });
        }
        artifacts.push(DiscoveredArtifact {
            repo_path,
            issues,
        });
    }
    artifacts
}

/// Checks for README presence and the three required sections.
async fn readme_issue(repo_path: &std::path::Path) -> Option<HygieneIssue> {
    let readme_path = [repo_path.join("README.md"), repo_path.join("README")]
        .into_iter()
        .find(|candidate| candidate.exists())?;
    let contents = tokio::fs::read_to_string(&readme_path).await.unwrap_or_default();
    let has_all_sections = REQUIRED_README_SECTIONS.iter().all(|section| contents.contains(section));
    if has_all_sections {
        None
    } else {
        Some(HygieneIssue {
            issue_type: "incomplete_readme".to_owned(),
            severity: IssueSeverity::Medium,
        })
    }
}

// ============================================================================
// SECTION: Select
// ============================================================================

/// Identity filtering hook; preserves input order.
#[must_use]
pub fn select(artifacts: Vec<DiscoveredArtifact>) -> Vec<DiscoveredArtifact> {
    artifacts
}

// ============================================================================
// SECTION: Verify
// ============================================================================

/// The result of the Verify stage for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedArtifact {
    /// The candidate this verification result is for.
    pub artifact: DiscoveredArtifact,
    /// Always `true` in this protocol version; the hook for provenance work.
    pub is_valid: bool,
    /// Always empty in this protocol version.
    pub checks: Vec<String>,
}

/// Always passes every candidate through with `isValid = true`.
#[must_use]
pub fn verify(artifacts: Vec<DiscoveredArtifact>) -> Vec<VerifiedArtifact> {
    artifacts
        .into_iter()
        .map(|artifact| VerifiedArtifact {
            artifact,
            is_valid: true,
            checks: Vec::new(),
        })
        .collect()
}

// ============================================================================
// SECTION: Evaluate
// ============================================================================

/// The result of the Evaluate stage.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    /// One proposed intent per candidate (plus an injected violation, if any).
    pub intents: Vec<SideEffectIntent>,
    /// The policy evaluation run over `intents`.
    pub policy: PolicyEvaluation,
}

/// Builds one `OpenPr` intent per verified candidate, optionally injects a
/// `TagRepo` violation intent, then runs policy evaluation and stamps each
/// intent's `blocked_by_policy`/`policy_denial_reasons` fields.
#[must_use]
pub fn evaluate(run: &MarketOpsRun, verified: &[VerifiedArtifact]) -> EvaluationOutcome {
    let mut intents: Vec<SideEffectIntent> = verified.iter().map(|candidate| propose_open_pr(run.run_id, run.mode, &candidate.artifact.repo_path)).collect();
    if run.simulate_violation() == Some("direct_push_main") {
        intents.push(propose_tag_repo_violation(run.run_id, run.mode));
    }
    let policy = evaluate_policy(&intents);
    for (intent, verdict) in intents.iter_mut().zip(policy.verdicts.iter()) {
        intent.blocked_by_policy = verdict.blocked_by_policy;
        intent.policy_denial_reasons.clone_from(&verdict.policy_denial_reasons);
    }
    EvaluationOutcome {
        intents,
        policy,
    }
}

fn propose_open_pr(run_id: RunId, mode: crate::core::Mode, repo_path: &str) -> SideEffectIntent {
    SideEffectIntent {
        intent_id: IntentId::new(uuid::Uuid::new_v4().to_string()),
        run_id,
        mode,
        kind: SideEffectKind::OpenPr,
        target: SideEffectTarget {
            system: "github".to_owned(),
            target_ref: repo_path.to_owned(),
        },
        params: serde_json::Map::new(),
        created_at_utc: Timestamp::now(),
        blocked_by_mode: mode == crate::core::Mode::DryRun,
        required_authorization: RequiredAuthorization {
            receipt_type: if mode == crate::core::Mode::DryRun { "advisory" } else { "enforceable" }.to_owned(),
            enforceable_required: mode == crate::core::Mode::Prod,
        },
        blocked_by_policy: false,
        policy_denial_reasons: Vec::new(),
        intent_digest: None,
    }
}

fn propose_tag_repo_violation(run_id: RunId, mode: crate::core::Mode) -> SideEffectIntent {
    let mut params = serde_json::Map::new();
    params.insert("branch".to_owned(), serde_json::json!("main"));
    SideEffectIntent {
        intent_id: IntentId::new(uuid::Uuid::new_v4().to_string()),
        run_id,
        mode,
        kind: SideEffectKind::TagRepo,
        target: SideEffectTarget {
            system: "github".to_owned(),
            target_ref: "…\\main".to_owned(),
        },
        params,
        created_at_utc: Timestamp::now(),
        blocked_by_mode: mode == crate::core::Mode::DryRun,
        required_authorization: RequiredAuthorization {
            receipt_type: if mode == crate::core::Mode::DryRun { "advisory" } else { "enforceable" }.to_owned(),
            enforceable_required: mode == crate::core::Mode::Prod,
        },
        blocked_by_policy: false,
        policy_denial_reasons: Vec::new(),
        intent_digest: None,
    }
}

// ============================================================================
// SECTION: Plan
// ============================================================================

use crate::core::PublicationPlan;
use crate::core::TenantId;

/// Builds the publication plan from the evaluation outcome. Approved ⇒ every
/// candidate ships; denied ⇒ every candidate is blocked and each denial
/// reason is recorded under a fresh opaque key.
#[must_use]
pub fn plan(run: &MarketOpsRun, tenant_id: &TenantId, outcome: &EvaluationOutcome) -> PublicationPlan {
    let candidates: Vec<String> = outcome.intents.iter().map(|intent| intent.target.target_ref.clone()).collect();
    if outcome.policy.is_approved {
        PublicationPlan::all_ship(run.run_id, tenant_id.clone(), run.mode, candidates)
    } else {
        let denial_messages: Vec<String> = outcome
            .intents
            .iter()
            .flat_map(|intent| intent.policy_denial_reasons.iter().map(|reason| format!("{reason} (intent {})", intent.intent_id)))
            .collect();
        PublicationPlan::all_blocked(run.run_id, tenant_id.clone(), run.mode, candidates, &denial_messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Mode;

    #[tokio::test]
    async fn discover_skips_missing_directories_silently() {
        let mut input = serde_json::Map::new();
        input.insert("repos".to_owned(), serde_json::json!(["/nonexistent/repo/path/for/tests"]));
        let run = MarketOpsRun::start(TenantId::new("t"), Mode::DryRun, input, None);
        let artifacts = discover(&run).await;
        assert!(artifacts.is_empty());
    }

    #[tokio::test]
    async fn discover_flags_missing_codeowners_and_editorconfig() {
        let dir = tempfile::tempdir().expect("tempdir");
        tokio::fs::write(dir.path().join("README.md"), "## Installation\n## Usage\n## License\n").await.expect("write readme");
        let mut input = serde_json::Map::new();
        input.insert("repos".to_owned(), serde_json::json!([dir.path().to_string_lossy()]));
        let run = MarketOpsRun::start(TenantId::new("t"), Mode::DryRun, input, None);
        let artifacts = discover(&run).await;
        assert_eq!(artifacts.len(), 1);
        let issue_types: Vec<&str> = artifacts[0].issues.iter().map(|issue| issue.issue_type.as_str()).collect();
        assert!(issue_types.contains(&"missing_codeowners"));
        assert!(issue_types.contains(&"missing_editorconfig"));
        assert!(!issue_types.contains(&"incomplete_readme"));
    }

    #[test]
    fn evaluate_injects_violation_intent_on_simulate_flag() {
        let mut input = serde_json::Map::new();
        input.insert("simulateViolation".to_owned(), serde_json::json!("direct_push_main"));
        let run = MarketOpsRun::start(TenantId::new("t"), Mode::DryRun, input, None);
        let verified = verify(vec![DiscoveredArtifact {
            repo_path: "/tmp/repo-a".to_owned(),
            issues: Vec::new(),
        }]);
        let outcome = evaluate(&run, &verified);
        assert_eq!(outcome.intents.len(), 2);
        assert!(!outcome.policy.is_approved);
    }

    #[test]
    fn plan_ships_everything_when_approved() {
        let run = MarketOpsRun::start(TenantId::new("t"), Mode::DryRun, serde_json::Map::new(), None);
        let verified = verify(vec![DiscoveredArtifact {
            repo_path: "/tmp/repo-a".to_owned(),
            issues: Vec::new(),
        }]);
        let outcome = evaluate(&run, &verified);
        let built = plan(&run, &TenantId::new("t"), &outcome);
        assert_eq!(built.would_ship.len(), 1);
        assert!(built.would_not_ship.is_empty());
    }
}
