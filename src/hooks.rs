//! Extension hooks.
//!
//! These traits are the seam between the deterministic engine and external
//! (possibly learned or LLM-backed) implementations: candidate generation
//! for the ambiguity gate, risk assessment, and rule extraction from
//! rationale text. The engine depends only on the traits and ships neutral
//! no-op implementations, so it is fully functional with the hooks absent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decision::Decision;
use crate::enforce::{Action, ActionType};
use crate::resolve::Candidate;

/// Risk assessment of an action against a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    /// The assessor has no opinion; treated as neutral by callers.
    Unknown,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// An enforceable rule extracted from decision rationale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub action_types: Vec<ActionType>,
    pub description: String,
}

/// Proposes clarification candidates for an unresolved query.
pub trait AmbiguityScorer: Send + Sync {
    /// Candidates for *query*, most plausible first. May be empty.
    fn score_candidates(&self, query: &str, query_scope: &str) -> Vec<Candidate>;
}

/// Assesses the risk of an action in light of a decision.
pub trait RiskScorer: Send + Sync {
    fn assess(&self, action: &Action, decision: &Decision) -> RiskLevel;
}

/// Compiles decision rationale into enforceable rules.
pub trait DecisionCompiler: Send + Sync {
    fn extract_rules(&self, rationale: &str) -> Vec<Rule>;
}

/// Neutral ambiguity scorer: proposes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAmbiguityScorer;

impl AmbiguityScorer for NoopAmbiguityScorer {
    fn score_candidates(&self, _query: &str, _query_scope: &str) -> Vec<Candidate> {
        Vec::new()
    }
}

/// Neutral risk scorer: always `Unknown`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRiskScorer;

impl RiskScorer for NoopRiskScorer {
    fn assess(&self, _action: &Action, _decision: &Decision) -> RiskLevel {
        RiskLevel::Unknown
    }
}

/// Neutral compiler: extracts nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDecisionCompiler;

impl DecisionCompiler for NoopDecisionCompiler {
    fn extract_rules(&self, _rationale: &str) -> Vec<Rule> {
        Vec::new()
    }
}
