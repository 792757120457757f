//! Enforcement engine.
//!
//! Given a proposed action and a snapshot of active decisions, the engine
//! produces a verdict: `allow`, `confirm` (human-in-the-loop), or `block`.
//! Evaluation is deterministic and total; an action that matches nothing is
//! allowed with an explicit reason, never an error. When several applicable
//! decisions express an opinion, precedence arbitration picks one winner and
//! records the overridden decisions in the result, so the pick is part of
//! the audit trail rather than a silent choice.

use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::{
    ConsideredOption, Decision, DecisionId, DecisionType, OverridePolicy,
};
use crate::scope;

const REGEX_CACHE_MAX: usize = 1024;

static REGEX_CACHE: OnceLock<RwLock<HashMap<String, regex::Regex>>> = OnceLock::new();

/// Compiles (or fetches) the word-boundary pattern for an option title.
///
/// Patterns are built from escaped input, so compilation cannot fail on
/// user data; a poisoned cache lock degrades to recompiling.
fn boundary_regex(title: &str) -> Option<regex::Regex> {
    let lowered = title.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    let mut pattern = String::with_capacity(lowered.len() + 8);
    pattern.push_str(r"\b");
    for (i, token) in lowered.split_whitespace().enumerate() {
        if i > 0 {
            pattern.push_str(r"\s+");
        }
        pattern.push_str(&regex::escape(token));
    }
    pattern.push_str(r"\b");

    let cache = REGEX_CACHE.get_or_init(|| RwLock::new(HashMap::new()));

    if let Ok(guard) = cache.read() {
        if let Some(re) = guard.get(&pattern) {
            return Some(re.clone());
        }
    }

    let compiled = regex::Regex::new(&pattern).ok()?;

    if let Ok(mut guard) = cache.write() {
        if guard.len() >= REGEX_CACHE_MAX {
            // Keep the cache bounded.
            guard.clear();
        }
        guard
            .entry(pattern)
            .or_insert_with(|| compiled.clone());
    }
    Some(compiled)
}

/// Classification of an action under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CodeChange,
    Migration,
    ApiBreak,
    Deployment,
    ConfigChange,
    Generic,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodeChange => write!(f, "code_change"),
            Self::Migration => write!(f, "migration"),
            Self::ApiBreak => write!(f, "api_break"),
            Self::Deployment => write!(f, "deployment"),
            Self::ConfigChange => write!(f, "config_change"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// A proposed action to evaluate against the active decision set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionType,
    pub description: String,
    pub scope: String,

    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Action {
    /// Creates an action with empty metadata.
    #[must_use]
    pub fn new(
        action_type: ActionType,
        description: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            description: description.into(),
            scope: scope.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Sets a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Outcome of enforcement evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    Confirm,
    Block,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Confirm => write!(f, "confirm"),
            Self::Block => write!(f, "block"),
        }
    }
}

/// Audit record of precedence arbitration among disagreeing decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// The decision whose opinion stands.
    pub winner: DecisionId,
    /// Decisions whose opinions were overridden, in arbitration order.
    pub overridden: Vec<DecisionId>,
}

/// Result of evaluating an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementResult {
    pub verdict: Verdict,
    pub reason: String,

    /// Decisions whose opinion produced the verdict.
    #[serde(default)]
    pub matched_decisions: Vec<DecisionId>,

    /// Decisions requiring explicit confirmation before the action proceeds.
    #[serde(default)]
    pub required_confirmations: Vec<DecisionId>,

    /// Present when arbitration overrode at least one decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictRecord>,
}

impl EnforcementResult {
    fn allow_default() -> Self {
        Self {
            verdict: Verdict::Allow,
            reason: "no applicable decision".to_string(),
            matched_decisions: Vec::new(),
            required_confirmations: Vec::new(),
            conflict: None,
        }
    }
}

/// Deterministic test for "does this action use a rejected option?".
///
/// Pluggable because the choice of algorithm directly decides
/// `block`/`allow` outcomes; the default is [`WordBoundaryMatcher`].
pub trait RejectionMatcher: Send + Sync {
    /// Returns true if *action* corresponds to *option*.
    fn matches(&self, action: &Action, option: &ConsideredOption) -> bool;
}

/// Default matcher.
///
/// Matches when the rejected option's title occurs in the action description
/// as a whole word sequence (case-insensitive, whitespace-tolerant), or when
/// the action's `option_id` metadata entry equals the option id. Substrings
/// inside larger words do not match: "Mongo" does not hit "Mongoose".
#[derive(Debug, Default, Clone, Copy)]
pub struct WordBoundaryMatcher;

impl RejectionMatcher for WordBoundaryMatcher {
    fn matches(&self, action: &Action, option: &ConsideredOption) -> bool {
        if let Some(option_id) = action.metadata.get("option_id").and_then(|v| v.as_str()) {
            if option_id == option.id {
                return true;
            }
        }

        let Some(re) = boundary_regex(&option.title) else {
            return false;
        };
        re.is_match(&action.description.to_lowercase())
    }
}

/// One applicable decision's opinion about the action.
#[derive(Debug, Clone)]
struct Opinion {
    decision_id: DecisionId,
    verdict: Verdict,
    reason: String,
    requires_confirmation: bool,
    specificity: usize,
    precedence: i64,
    created_at: DateTime<Utc>,
}

/// Evaluates actions against a snapshot of decisions.
pub struct EnforcementEngine {
    matcher: Box<dyn RejectionMatcher>,
}

impl Default for EnforcementEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EnforcementEngine {
    /// Engine with the default word-boundary matcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            matcher: Box::new(WordBoundaryMatcher),
        }
    }

    /// Engine with a caller-supplied matcher.
    #[must_use]
    pub fn with_matcher(matcher: Box<dyn RejectionMatcher>) -> Self {
        Self { matcher }
    }

    /// Evaluates *action* against *decisions*.
    ///
    /// Only active decisions whose scope covers the action's scope are
    /// considered. Always terminates with a verdict; identical inputs yield
    /// identical results.
    #[must_use]
    pub fn evaluate(&self, action: &Action, decisions: &[Decision]) -> EnforcementResult {
        let mut opinions: Vec<Opinion> = Vec::new();

        for decision in decisions {
            if !decision.is_active() {
                continue;
            }
            if !scope::covers(decision.scope(), &action.scope) {
                continue;
            }

            if let Some(opinion) = self.form_opinion(action, decision) {
                opinions.push(opinion);
            }
        }

        if opinions.is_empty() {
            return EnforcementResult::allow_default();
        }

        // Arbitration order: specificity desc, explicit precedence desc,
        // activation recency desc, id as the stable final key.
        opinions.sort_by(|a, b| {
            b.specificity
                .cmp(&a.specificity)
                .then_with(|| b.precedence.cmp(&a.precedence))
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.decision_id.to_string().cmp(&b.decision_id.to_string()))
        });

        let winner = &opinions[0];
        let overridden: Vec<DecisionId> =
            opinions[1..].iter().map(|o| o.decision_id).collect();

        let required_confirmations = if winner.requires_confirmation {
            vec![winner.decision_id]
        } else {
            Vec::new()
        };

        EnforcementResult {
            verdict: winner.verdict,
            reason: winner.reason.clone(),
            matched_decisions: vec![winner.decision_id],
            required_confirmations,
            conflict: if overridden.is_empty() {
                None
            } else {
                Some(ConflictRecord {
                    winner: winner.decision_id,
                    overridden,
                })
            },
        }
    }

    /// An applicable decision's opinion, or `None` if it is neutral about
    /// this action.
    fn form_opinion(&self, action: &Action, decision: &Decision) -> Option<Opinion> {
        let specificity = scope::specificity_of(decision.scope());
        let base = |verdict, reason, requires_confirmation| Opinion {
            decision_id: decision.id,
            verdict,
            reason,
            requires_confirmation,
            specificity,
            precedence: decision.precedence(),
            created_at: decision.created_at,
        };

        let rejected_hit = decision
            .rejected_options()
            .find(|option| self.matcher.matches(action, option));

        if let Some(option) = rejected_hit {
            return match decision.enforcement.override_policy {
                OverridePolicy::InvalidByDefault => Some(base(
                    Verdict::Block,
                    format!(
                        "action matches rejected option '{}' in decision '{}' (override_policy=invalid_by_default)",
                        option.title,
                        decision.id.short()
                    ),
                    false,
                )),
                OverridePolicy::Warn => Some(base(
                    Verdict::Confirm,
                    format!(
                        "action matches rejected option '{}' in decision '{}' (override_policy=warn)",
                        option.title,
                        decision.id.short()
                    ),
                    true,
                )),
                OverridePolicy::Allow => Some(base(
                    Verdict::Allow,
                    format!(
                        "action matches rejected option '{}' in decision '{}' (override_policy=allow)",
                        option.title,
                        decision.id.short()
                    ),
                    false,
                )),
            };
        }

        // Behavior rules constrain structurally risky action types.
        if decision.enforcement.decision_type == DecisionType::BehaviorRule
            && matches!(action.action_type, ActionType::Migration | ActionType::ApiBreak)
        {
            return Some(base(
                Verdict::Confirm,
                format!(
                    "action type '{}' requires confirmation per decision '{}'",
                    action.action_type,
                    decision.id.short()
                ),
                true,
            ));
        }

        None
    }
}
