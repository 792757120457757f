//! COMMIT operation builder.
//!
//! The CommitBuilder provides a fluent, type-safe API for constructing
//! commit payloads. Required fields are checked at build time, so a payload
//! that exists is one the engine can act on.

use crate::decision::{
    ConsideredOption, Decision, DecisionContext, DecisionId, DecisionType, OverridePolicy,
};
use crate::error::ValidationError;

/// A validated request to commit a new decision.
#[derive(Debug, Clone)]
pub struct CommitPayload {
    pub title: String,
    pub scope: String,
    pub decision_type: DecisionType,
    pub rationale: Option<String>,
    pub options: Vec<ConsideredOption>,
    pub context: Option<DecisionContext>,
    pub stakeholders: Vec<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub override_policy: Option<OverridePolicy>,
    pub precedence: Option<i64>,
    pub supersedes: Option<DecisionId>,
}

impl CommitPayload {
    /// Materializes the payload as a draft [`Decision`].
    pub fn into_decision(self) -> Result<Decision, ValidationError> {
        let mut builder = Decision::builder()
            .title(self.title)
            .scope(self.scope)
            .decision_type(self.decision_type);

        if let Some(rationale) = self.rationale {
            builder = builder.rationale(rationale);
        }
        for option in self.options {
            builder = builder.option(option);
        }
        if let Some(context) = self.context {
            builder = builder.context(context);
        }
        for stakeholder in self.stakeholders {
            builder = builder.stakeholder(stakeholder);
        }
        for (key, value) in self.metadata {
            builder = builder.metadata_entry(key, value);
        }
        if let Some(policy) = self.override_policy {
            builder = builder.override_policy(policy);
        }
        if let Some(precedence) = self.precedence {
            builder = builder.precedence(precedence);
        }
        if let Some(supersedes) = self.supersedes {
            builder = builder.supersedes(supersedes);
        }

        builder.build()
    }
}

/// Builder for commit payloads.
///
/// # Example
/// ```
/// use decree::decision::{ConsideredOption, DecisionType};
/// use decree::operations::CommitBuilder;
///
/// let payload = CommitBuilder::new()
///     .title("Use PostgreSQL for persistence")
///     .scope("repo:acme")
///     .decision_type(DecisionType::Rejection)
///     .option(ConsideredOption::rejected("MongoDB", None))
///     .build()
///     .unwrap();
///
/// assert_eq!(payload.scope, "repo:acme");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommitBuilder {
    title: Option<String>,
    scope: Option<String>,
    decision_type: Option<DecisionType>,
    rationale: Option<String>,
    options: Vec<ConsideredOption>,
    context: Option<DecisionContext>,
    stakeholders: Vec<String>,
    metadata: serde_json::Map<String, serde_json::Value>,
    override_policy: Option<OverridePolicy>,
    precedence: Option<i64>,
    supersedes: Option<DecisionId>,
}

impl CommitBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the decision title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the enforcement scope.
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the decision type.
    #[must_use]
    pub fn decision_type(mut self, decision_type: DecisionType) -> Self {
        self.decision_type = Some(decision_type);
        self
    }

    /// Sets the rationale.
    #[must_use]
    pub fn rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    /// Appends a considered option.
    #[must_use]
    pub fn option(mut self, option: ConsideredOption) -> Self {
        self.options.push(option);
        self
    }

    /// Sets the provenance context.
    #[must_use]
    pub fn context(mut self, context: DecisionContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Appends a stakeholder.
    #[must_use]
    pub fn stakeholder(mut self, stakeholder: impl Into<String>) -> Self {
        self.stakeholders.push(stakeholder.into());
        self
    }

    /// Sets a metadata entry.
    #[must_use]
    pub fn metadata_entry(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Declares the binding key explicitly.
    #[must_use]
    pub fn binding_key(self, key: impl Into<String>) -> Self {
        self.metadata_entry("binding_key", serde_json::Value::String(key.into()))
    }

    /// Sets the override policy.
    #[must_use]
    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = Some(policy);
        self
    }

    /// Sets the explicit precedence.
    #[must_use]
    pub fn precedence(mut self, precedence: i64) -> Self {
        self.precedence = Some(precedence);
        self
    }

    /// Records the decision this commit supersedes.
    #[must_use]
    pub fn supersedes(mut self, supersedes: DecisionId) -> Self {
        self.supersedes = Some(supersedes);
        self
    }

    /// Builds the payload.
    ///
    /// Returns `ValidationError` if title, scope, or decision type is
    /// missing or empty.
    pub fn build(self) -> Result<CommitPayload, ValidationError> {
        let title = self.title.ok_or(ValidationError::MissingField {
            field: "title".to_string(),
        })?;
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let scope = self.scope.ok_or(ValidationError::MissingField {
            field: "scope".to_string(),
        })?;
        if scope.trim().is_empty() {
            return Err(ValidationError::EmptyScope);
        }

        let decision_type = self.decision_type.ok_or(ValidationError::MissingField {
            field: "decision_type".to_string(),
        })?;

        Ok(CommitPayload {
            title,
            scope,
            decision_type,
            rationale: self.rationale,
            options: self.options,
            context: self.context,
            stakeholders: self.stakeholders,
            metadata: self.metadata,
            override_policy: self.override_policy,
            precedence: self.precedence,
            supersedes: self.supersedes,
        })
    }
}
