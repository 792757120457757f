//! SUPERSEDE operation fields.

use crate::decision::{
    ConsideredOption, DecisionContext, DecisionType, OverridePolicy,
};

/// Fields for the replacement decision in a supersession.
///
/// Only `title` is required; `scope` and `decision_type` default to the old
/// decision's values when left unset. The replacement is a new record: it
/// gets a fresh id and restarts its version count.
#[derive(Debug, Clone, Default)]
pub struct SupersedeFields {
    pub title: String,
    pub scope: Option<String>,
    pub decision_type: Option<DecisionType>,
    pub rationale: Option<String>,
    pub options: Vec<ConsideredOption>,
    pub context: Option<DecisionContext>,
    pub stakeholders: Vec<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub override_policy: Option<OverridePolicy>,
    pub precedence: Option<i64>,
}

impl SupersedeFields {
    /// Replacement fields carrying only a new title; everything else is
    /// inherited from the superseded decision.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}
