//! Decision types—the atomic unit of institutional knowledge.
//!
//! A Decision is not just data; it is a recorded institutional choice with
//! the alternatives that were weighed, the provenance of the choice, and
//! the rule by which it is enforced. Once a decision activates, the choice
//! itself is frozen; only its lifecycle status and open metadata may move.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::binding::{derived_option_id, BindingKey};
use crate::error::ValidationError;

/// Globally unique, stable decision identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(Uuid);

impl DecisionId {
    /// Creates a new random decision ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a decision ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Short human-readable form for log lines and error messages.
    #[must_use]
    pub fn short(&self) -> String {
        format!("dec_{}", &self.0.simple().to_string()[..12])
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DecisionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Lifecycle status of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Draft,
    Active,
    Superseded,
    Archived,
}

impl Default for DecisionStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Active => write!(f, "active"),
            Self::Superseded => write!(f, "superseded"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

/// Classification of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    /// Fixes the meaning of a term or query ("revenue means net revenue").
    Interpretation,
    /// Records a rejected alternative ("reject MongoDB").
    Rejection,
    /// Records a preferred alternative without forbidding others.
    Preference,
    /// Constrains how certain action types may proceed.
    BehaviorRule,
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interpretation => write!(f, "interpretation"),
            Self::Rejection => write!(f, "rejection"),
            Self::Preference => write!(f, "preference"),
            Self::BehaviorRule => write!(f, "behavior_rule"),
        }
    }
}

/// How enforcement treats use of a rejected option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePolicy {
    /// Violations are blocked outright.
    InvalidByDefault,
    /// Violations require human confirmation.
    Warn,
    /// Violations pass, but the match is still reported for audit.
    Allow,
}

impl Default for OverridePolicy {
    fn default() -> Self {
        Self::InvalidByDefault
    }
}

impl fmt::Display for OverridePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidByDefault => write!(f, "invalid_by_default"),
            Self::Warn => write!(f, "warn"),
            Self::Allow => write!(f, "allow"),
        }
    }
}

/// An alternative that was evaluated when the decision was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsideredOption {
    pub id: String,
    pub title: String,
    pub selected: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
}

impl ConsideredOption {
    /// A selected option.
    #[must_use]
    pub fn selected(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: derived_option_id(&title),
            title,
            selected: true,
            rejected_reason: None,
        }
    }

    /// A rejected option, with an optional reason.
    #[must_use]
    pub fn rejected(title: impl Into<String>, reason: Option<String>) -> Self {
        let title = title.into();
        Self {
            id: derived_option_id(&title),
            title,
            selected: false,
            rejected_reason: reason,
        }
    }
}

/// Provenance: when, why, and by whom the decision was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionContext {
    pub trigger: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

/// The enforcement rule bound to a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enforcement {
    pub scope: String,
    pub decision_type: DecisionType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<DecisionId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub precedence: Option<i64>,

    #[serde(default)]
    pub override_policy: OverridePolicy,
}

impl Enforcement {
    /// Creates an enforcement rule with defaults for the optional fields.
    #[must_use]
    pub fn new(scope: impl Into<String>, decision_type: DecisionType) -> Self {
        Self {
            scope: scope.into(),
            decision_type,
            supersedes: None,
            precedence: None,
            override_policy: OverridePolicy::default(),
        }
    }
}

/// The atomic unit of institutional knowledge.
///
/// # Examples
///
/// ```
/// use decree::decision::{ConsideredOption, Decision, DecisionType};
///
/// let decision = Decision::builder()
///     .title("Use PostgreSQL for persistence")
///     .scope("repo:acme")
///     .decision_type(DecisionType::Rejection)
///     .option(ConsideredOption::selected("PostgreSQL"))
///     .option(ConsideredOption::rejected("MongoDB", Some("no transactions".into())))
///     .build()
///     .unwrap();
///
/// assert_eq!(decision.enforcement.scope, "repo:acme");
/// assert_eq!(decision.version, 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub id: DecisionId,

    /// Incremented on every mutation, starting at 0.
    #[serde(default)]
    pub version: u64,

    #[serde(default)]
    pub status: DecisionStatus,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,

    #[serde(default)]
    pub options_considered: Vec<ConsideredOption>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<DecisionContext>,

    pub enforcement: Enforcement,

    #[serde(default)]
    pub stakeholders: Vec<String>,

    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Decision {
    pub fn builder() -> DecisionBuilder {
        DecisionBuilder::new()
    }

    /// Returns true if the decision is currently in effect.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == DecisionStatus::Active
    }

    /// The scope string this decision binds to.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.enforcement.scope
    }

    /// Explicit precedence, absent treated as 0.
    #[must_use]
    pub fn precedence(&self) -> i64 {
        self.enforcement.precedence.unwrap_or(0)
    }

    /// The key under which this decision answers "the same question".
    ///
    /// Caller-declared via the `binding_key` metadata entry, otherwise
    /// derived from the title.
    #[must_use]
    pub fn binding_key(&self) -> BindingKey {
        match self.metadata.get("binding_key").and_then(|v| v.as_str()) {
            Some(declared) if !declared.trim().is_empty() => BindingKey::derive(declared),
            _ => BindingKey::derive(&self.title),
        }
    }

    /// Rejected options, in declaration order.
    pub fn rejected_options(&self) -> impl Iterator<Item = &ConsideredOption> {
        self.options_considered.iter().filter(|o| !o.selected)
    }

    /// Validates the structural invariants on an already-built record.
    ///
    /// Applied at the load boundary; records failing here never enter the
    /// active set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.enforcement.scope.trim().is_empty() {
            return Err(ValidationError::EmptyScope);
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(self.options_considered.len());
        for option in &self.options_considered {
            if !seen.insert(option.id.as_str()) {
                return Err(ValidationError::DuplicateOptionId {
                    option_id: option.id.clone(),
                });
            }
        }

        Ok(())
    }
}

impl PartialEq for Decision {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Decision {}

impl std::hash::Hash for Decision {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Binding-set ordering: specificity desc, explicit precedence desc,
/// creation recency desc, then id for a stable total order.
///
/// Shared by `inspect` and the resolve gate so both rank candidates the
/// same way enforcement arbitration does.
#[must_use]
pub fn binding_order(a: &Decision, b: &Decision) -> std::cmp::Ordering {
    crate::scope::specificity_of(b.scope())
        .cmp(&crate::scope::specificity_of(a.scope()))
        .then_with(|| b.precedence().cmp(&a.precedence()))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
}

/// Builder for creating Decision instances.
///
/// Ensures required fields are set and structural invariants hold before
/// the record exists at all.
#[derive(Debug, Default)]
pub struct DecisionBuilder {
    id: Option<DecisionId>,
    title: Option<String>,
    rationale: Option<String>,
    options: Vec<ConsideredOption>,
    context: Option<DecisionContext>,
    scope: Option<String>,
    decision_type: Option<DecisionType>,
    supersedes: Option<DecisionId>,
    precedence: Option<i64>,
    override_policy: Option<OverridePolicy>,
    stakeholders: Vec<String>,
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl DecisionBuilder {
    /// Creates a new decision builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the decision ID (optional, generated if not set).
    #[must_use]
    pub fn id(mut self, id: DecisionId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
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

    /// Records the decision this one supersedes.
    #[must_use]
    pub fn supersedes(mut self, supersedes: DecisionId) -> Self {
        self.supersedes = Some(supersedes);
        self
    }

    /// Sets the explicit precedence.
    #[must_use]
    pub fn precedence(mut self, precedence: i64) -> Self {
        self.precedence = Some(precedence);
        self
    }

    /// Sets the override policy (default: `invalid_by_default`).
    #[must_use]
    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = Some(policy);
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

    /// Declares the binding key explicitly instead of deriving it from the
    /// title.
    #[must_use]
    pub fn binding_key(self, key: impl Into<String>) -> Self {
        self.metadata_entry("binding_key", serde_json::Value::String(key.into()))
    }

    /// Builds the Decision in `draft` status.
    ///
    /// Returns `ValidationError` if required fields are missing or the
    /// structural invariants do not hold.
    pub fn build(self) -> Result<Decision, ValidationError> {
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

        let now = Utc::now();
        let decision = Decision {
            id: self.id.unwrap_or_else(DecisionId::new),
            version: 0,
            status: DecisionStatus::Draft,
            title,
            rationale: self.rationale,
            options_considered: self.options,
            context: self.context,
            enforcement: Enforcement {
                scope,
                decision_type,
                supersedes: self.supersedes,
                precedence: self.precedence,
                override_policy: self.override_policy.unwrap_or_default(),
            },
            stakeholders: self.stakeholders,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        };

        decision.validate()?;
        Ok(decision)
    }
}
