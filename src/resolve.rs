//! Resolve operation and ambiguity gate.
//!
//! `resolve` decides whether a prior decision already answers a query: it
//! matches the query's binding key against active `interpretation` decisions
//! whose scope covers the query scope. A hit returns the decision's context;
//! a miss is not an error but a first-class `needs_clarification` outcome.
//! The gate never invents candidates: it echoes caller-supplied ones
//! verbatim, and falls back to a generic prompt otherwise.

use serde::{Deserialize, Serialize};

use crate::binding::BindingKey;
use crate::decision::{binding_order, Decision, DecisionId, DecisionType};
use crate::scope;

/// A candidate option supplied by the caller (or an external scorer hook)
/// for disambiguation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,

    #[serde(default = "default_candidate_source")]
    pub source: String,

    #[serde(default = "default_candidate_confidence")]
    pub confidence: f64,
}

fn default_candidate_source() -> String {
    "caller".to_string()
}

const fn default_candidate_confidence() -> f64 {
    0.5
}

impl Candidate {
    /// A caller-supplied candidate with default source and confidence.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source: default_candidate_source(),
            confidence: default_candidate_confidence(),
        }
    }
}

/// A request for the caller to clarify intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    pub question: String,
    pub candidates: Vec<Candidate>,

    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// Result of the resolve operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolveOutcome {
    /// A prior decision answers the query.
    Resolved {
        resolved_context: Box<Decision>,
        matched_decision_id: DecisionId,
    },

    /// No prior decision; the caller must clarify or commit.
    NeedsClarification { clarification: ClarificationRequest },
}

impl ResolveOutcome {
    /// Returns true if a prior decision answered the query.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// The matched decision id, if resolved.
    #[must_use]
    pub const fn matched_decision_id(&self) -> Option<DecisionId> {
        match self {
            Self::Resolved {
                matched_decision_id,
                ..
            } => Some(*matched_decision_id),
            Self::NeedsClarification { .. } => None,
        }
    }
}

fn clarification_context(query: &str, query_scope: &str) -> serde_json::Map<String, serde_json::Value> {
    let mut context = serde_json::Map::new();
    context.insert("query".to_string(), serde_json::json!(query));
    context.insert("scope".to_string(), serde_json::json!(query_scope));
    context
}

/// Resolves *query* under *query_scope* against *decisions*.
///
/// Matching is binding-key equality, never fuzzy: the query's normalized key
/// must equal an active `interpretation` decision's key, and that decision's
/// scope must cover the query scope. When several decisions match, the
/// binding-set order picks the winner, so repeated identical calls return
/// the same decision until it is superseded or archived.
#[must_use]
pub fn resolve(
    query: &str,
    query_scope: &str,
    candidates: Vec<Candidate>,
    decisions: &[Decision],
) -> ResolveOutcome {
    let key = BindingKey::derive(query);

    if !key.is_empty() {
        let mut matches: Vec<&Decision> = decisions
            .iter()
            .filter(|d| {
                d.is_active()
                    && d.enforcement.decision_type == DecisionType::Interpretation
                    && scope::covers(d.scope(), query_scope)
                    && d.binding_key() == key
            })
            .collect();
        matches.sort_by(|a, b| binding_order(a, b));

        if let Some(decision) = matches.first() {
            return ResolveOutcome::Resolved {
                resolved_context: Box::new((*decision).clone()),
                matched_decision_id: decision.id,
            };
        }
    }

    if candidates.is_empty() {
        ResolveOutcome::NeedsClarification {
            clarification: ClarificationRequest {
                question: "No prior decision found. Please clarify intent.".to_string(),
                candidates: Vec::new(),
                context: clarification_context(query, query_scope),
            },
        }
    } else {
        ResolveOutcome::NeedsClarification {
            clarification: ClarificationRequest {
                question: format!("Multiple options exist for '{query}'. Please select one."),
                candidates,
                context: clarification_context(query, query_scope),
            },
        }
    }
}
