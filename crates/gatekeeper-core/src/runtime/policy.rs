// crates/gatekeeper-core/src/runtime/policy.rs
// ============================================================================
// Module: Gatekeeper Policy Evaluator
// Description: Pure deny-rule evaluation over side-effect intents.
// Purpose: Implement the two hardcoded deny rules as a deterministic function.
// Dependencies: crate::core::side_effect
// ============================================================================

//! ## Overview
//! The policy evaluator is a pure function: same input, same output,
//! including denial reason ordering (input order). It never performs I/O and
//! never consults a rule engine — the two rules are the entire policy
//! surface this protocol version defines.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::SideEffectIntent;
use crate::core::SideEffectKind;

// ============================================================================
// SECTION: Policy Evaluation
// ============================================================================

/// Stable reason id for a direct-push-to-main denial.
pub const DIRECT_PUSH_MAIN_REASON: &str = "policy.direct_push_main.denied.v1";
/// Stable reason id for a CI-weakening denial.
pub const CI_WEAKEN_REASON: &str = "policy.ci_weaken.denied.v1";

/// The result of evaluating one intent's policy compliance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentVerdict {
    /// Whether the policy evaluator denied this intent.
    pub blocked_by_policy: bool,
    /// Ordered denial reason ids, in rule-check order.
    pub policy_denial_reasons: Vec<String>,
}

/// Result of evaluating a full batch of intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEvaluation {
    /// `true` iff no intent was denied.
    pub is_approved: bool,
    /// Per-intent verdicts, in input order.
    pub verdicts: Vec<IntentVerdict>,
}

/// Evaluates the two hardcoded deny rules against each intent, in input
/// order. Deterministic: identical input always produces identical output.
#[must_use]
pub fn evaluate_policy(intents: &[SideEffectIntent]) -> PolicyEvaluation {
    let verdicts: Vec<IntentVerdict> = intents.iter().map(evaluate_one).collect();
    let is_approved = verdicts.iter().all(|verdict| !verdict.blocked_by_policy);
    PolicyEvaluation {
        is_approved,
        verdicts,
    }
}

/// Evaluates the two deny rules against a single intent.
fn evaluate_one(intent: &SideEffectIntent) -> IntentVerdict {
    let mut reasons = Vec::new();

    let targets_main = intent.target.target_ref.to_lowercase().contains("main")
        || intent.params.get("branch").and_then(serde_json::Value::as_str).is_some_and(|branch| branch == "main");
    if intent.kind != SideEffectKind::OpenPr && targets_main {
        reasons.push(DIRECT_PUSH_MAIN_REASON.to_owned());
    }

    let targets_workflows = intent.target.target_ref.contains(".github/workflows") || intent.target.system.contains(".github/workflows");
    let weakening_action = intent
        .params
        .get("action")
        .and_then(serde_json::Value::as_str)
        .is_some_and(|action| matches!(action.to_lowercase().as_str(), "remove" | "weaken" | "disable"));
    if targets_workflows && weakening_action {
        reasons.push(CI_WEAKEN_REASON.to_owned());
    }

    IntentVerdict {
        blocked_by_policy: !reasons.is_empty(),
        policy_denial_reasons: reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IntentId;
    use crate::core::RequiredAuthorization;
    use crate::core::RunId;
    use crate::core::SideEffectTarget;
    use crate::core::Mode;
    use crate::core::Timestamp;

    fn intent(kind: SideEffectKind, target_ref: &str, params: serde_json::Map<String, serde_json::Value>) -> SideEffectIntent {
        SideEffectIntent {
            intent_id: IntentId::new("intent-1"),
            run_id: RunId::generate(),
            mode: Mode::DryRun,
            kind,
            target: SideEffectTarget {
                system: "github".to_owned(),
                target_ref: target_ref.to_owned(),
            },
            params,
            created_at_utc: Timestamp::now(),
            blocked_by_mode: true,
            required_authorization: RequiredAuthorization {
                receipt_type: "advisory".to_owned(),
                enforceable_required: false,
            },
            blocked_by_policy: false,
            policy_denial_reasons: Vec::new(),
            intent_digest: None,
        }
    }

    #[test]
    fn open_pr_to_main_is_not_denied() {
        let eval = evaluate_policy(&[intent(SideEffectKind::OpenPr, "refs/heads/main", serde_json::Map::new())]);
        assert!(eval.is_approved);
    }

    #[test]
    fn tag_repo_against_main_is_denied() {
        let eval = evaluate_policy(&[intent(SideEffectKind::TagRepo, "refs/heads/main", serde_json::Map::new())]);
        assert!(!eval.is_approved);
        assert_eq!(eval.verdicts[0].policy_denial_reasons, vec![DIRECT_PUSH_MAIN_REASON]);
    }

    #[test]
    fn ci_weakening_action_is_denied() {
        let mut params = serde_json::Map::new();
        params.insert("action".to_owned(), serde_json::json!("Disable"));
        let eval = evaluate_policy(&[intent(SideEffectKind::PublishRelease, ".github/workflows/ci.yml", params)]);
        assert!(!eval.is_approved);
        assert_eq!(eval.verdicts[0].policy_denial_reasons, vec![CI_WEAKEN_REASON]);
    }

    #[test]
    fn evaluation_is_pure_and_order_stable() {
        let intents = vec![
            intent(SideEffectKind::TagRepo, "main", serde_json::Map::new()),
            intent(SideEffectKind::OpenPr, "feature/x", serde_json::Map::new()),
        ];
        let first = evaluate_policy(&intents);
        let second = evaluate_policy(&intents);
        assert_eq!(first, second);
    }
}
