//! Decision engine facade.
//!
//! [`DecreeEngine`] exposes the public operations (`commit`, `inspect`,
//! `resolve`, `enforce`, `supersede`) over an injected store handle and the
//! extension hooks. The engine itself is pure computation over decision
//! snapshots: it performs no I/O beyond the store contract, holds no global
//! state, and is safe to share across request-handling threads.

use std::sync::Arc;

use tracing::debug;

use crate::decision::{Decision, DecisionId, DecisionStatus};
use crate::enforce::{Action, EnforcementEngine, EnforcementResult, RejectionMatcher};
use crate::error::{DecreeResult, StorageError};
use crate::hooks::{
    AmbiguityScorer, DecisionCompiler, NoopAmbiguityScorer, NoopDecisionCompiler, NoopRiskScorer,
    RiskScorer,
};
use crate::lifecycle::{apply_update, transition, DecisionUpdate};
use crate::operations::{CommitPayload, SupersedeFields};
use crate::resolve::{self, Candidate, ResolveOutcome};
use crate::storage::DecisionStore;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cap on the binding set returned by `inspect`; `None` = unbounded.
    pub inspect_limit: Option<usize>,

    /// Whether `resolve` appends scorer-proposed candidates after the
    /// caller's own.
    pub merge_scorer_candidates: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inspect_limit: None,
            merge_scorer_candidates: true,
        }
    }
}

/// The decision lifecycle, scope-resolution, and enforcement engine.
#[derive(Clone)]
pub struct DecreeEngine {
    store: Arc<dyn DecisionStore>,
    enforcement: Arc<EnforcementEngine>,
    ambiguity: Arc<dyn AmbiguityScorer>,
    risk: Arc<dyn RiskScorer>,
    compiler: Arc<dyn DecisionCompiler>,
    config: EngineConfig,
}

impl DecreeEngine {
    /// Creates an engine over the given store, with neutral hooks.
    #[must_use]
    pub fn new(store: Arc<dyn DecisionStore>) -> Self {
        Self {
            store,
            enforcement: Arc::new(EnforcementEngine::new()),
            ambiguity: Arc::new(NoopAmbiguityScorer),
            risk: Arc::new(NoopRiskScorer),
            compiler: Arc::new(NoopDecisionCompiler),
            config: EngineConfig::default(),
        }
    }

    /// Replaces the extension hooks.
    #[must_use]
    pub fn with_hooks(
        mut self,
        ambiguity: Arc<dyn AmbiguityScorer>,
        risk: Arc<dyn RiskScorer>,
        compiler: Arc<dyn DecisionCompiler>,
    ) -> Self {
        self.ambiguity = ambiguity;
        self.risk = risk;
        self.compiler = compiler;
        self
    }

    /// Replaces the rejected-option matcher.
    #[must_use]
    pub fn with_matcher(mut self, matcher: Box<dyn RejectionMatcher>) -> Self {
        self.enforcement = Arc::new(EnforcementEngine::with_matcher(matcher));
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Access the underlying store handle.
    pub fn store(&self) -> &Arc<dyn DecisionStore> {
        &self.store
    }

    /// Commits a new decision and activates it.
    ///
    /// The record is validated, created in `draft`, and transitioned to
    /// `active` before persisting, so committed decisions bind immediately.
    /// A commit colliding with an existing active (scope, binding key) is
    /// rejected by the store; callers wanting replacement semantics use
    /// [`DecreeEngine::supersede`].
    ///
    /// A payload carrying `supersedes` goes through the same atomic
    /// replacement path as `supersede`: the referenced decision must exist
    /// and be active, it transitions `active → superseded`, and both writes
    /// land through one `save_atomic` call.
    pub fn commit(&self, payload: CommitPayload) -> DecreeResult<Decision> {
        let mut draft = payload.into_decision()?;

        // Compile rationale into rules while the record is still mutable.
        if let Some(rationale) = draft.rationale.clone() {
            let rules = self.compiler.extract_rules(&rationale);
            if !rules.is_empty() {
                draft.metadata.insert(
                    "compiled_rules".to_string(),
                    serde_json::to_value(&rules)
                        .map_err(|e| StorageError::SerializationError(e.to_string()))?,
                );
            }
        }

        let active = match draft.enforcement.supersedes {
            Some(old_id) => {
                let old = self
                    .store
                    .load_by_id(old_id)?
                    .ok_or(StorageError::DecisionNotFound(old_id))?;
                self.replace_active(&old, &draft)?
            }
            None => {
                let active = transition(&draft, DecisionStatus::Active)?;
                self.store.save(&active)?;
                active
            }
        };

        debug!(
            decision = %active.id.short(),
            scope = active.scope(),
            "committed decision"
        );
        Ok(active)
    }

    /// Retires *old* and activates *draft* through one atomic write, so no
    /// observer sees the old decision still active alongside its successor.
    fn replace_active(&self, old: &Decision, draft: &Decision) -> DecreeResult<Decision> {
        let superseded = transition(old, DecisionStatus::Superseded)?;
        let active = transition(draft, DecisionStatus::Active)?;
        self.store.save_atomic(&[superseded, active.clone()])?;
        Ok(active)
    }

    /// Loads a decision by id.
    pub fn get(&self, id: DecisionId) -> DecreeResult<Decision> {
        self.store
            .load_by_id(id)?
            .ok_or_else(|| StorageError::DecisionNotFound(id).into())
    }

    /// The binding set for *scope*: all active decisions whose scope covers
    /// it, ordered by specificity, then precedence, then recency.
    pub fn inspect(&self, scope: &str) -> DecreeResult<Vec<Decision>> {
        let mut decisions = self.store.load_active(scope)?;
        if let Some(limit) = self.config.inspect_limit {
            decisions.truncate(limit);
        }
        Ok(decisions)
    }

    /// Runs the ambiguity gate for *query* under *scope*.
    ///
    /// Caller candidates are echoed verbatim and come first; when enabled,
    /// scorer-proposed candidates are appended (deduplicated by id). The
    /// gate itself never invents candidates.
    pub fn resolve(
        &self,
        query: &str,
        scope: &str,
        candidates: Vec<Candidate>,
    ) -> DecreeResult<ResolveOutcome> {
        let decisions = self.store.load_active(scope)?;

        let mut merged = candidates;
        if self.config.merge_scorer_candidates {
            for proposed in self.ambiguity.score_candidates(query, scope) {
                if merged.iter().all(|c| c.id != proposed.id) {
                    merged.push(proposed);
                }
            }
        }

        let outcome = resolve::resolve(query, scope, merged, &decisions);
        debug!(
            query,
            scope,
            resolved = outcome.is_resolved(),
            "resolved query"
        );
        Ok(outcome)
    }

    /// Evaluates a proposed action against the binding set of its scope.
    pub fn enforce(&self, action: &Action) -> DecreeResult<EnforcementResult> {
        let decisions = self.store.load_active(&action.scope)?;
        let result = self.enforcement.evaluate(action, &decisions);

        if let Some(winner) = result.matched_decisions.first() {
            if let Some(decision) = decisions.iter().find(|d| d.id == *winner) {
                let risk = self.risk.assess(action, decision);
                debug!(
                    decision = %winner,
                    verdict = %result.verdict,
                    risk = %risk,
                    "enforced action"
                );
            }
        } else {
            debug!(verdict = %result.verdict, "enforced action");
        }
        Ok(result)
    }

    /// Atomically replaces an active decision.
    ///
    /// The old decision transitions `active → superseded` and the
    /// replacement is activated carrying `enforcement.supersedes`; both
    /// writes land through one `save_atomic` call, so no observer sees one
    /// without the other. Scope and decision type default to the old
    /// decision's values.
    pub fn supersede(&self, old_id: DecisionId, fields: SupersedeFields) -> DecreeResult<Decision> {
        let old = self
            .store
            .load_by_id(old_id)?
            .ok_or(StorageError::DecisionNotFound(old_id))?;

        let mut builder = Decision::builder()
            .title(fields.title)
            .scope(fields.scope.unwrap_or_else(|| old.scope().to_string()))
            .decision_type(
                fields
                    .decision_type
                    .unwrap_or(old.enforcement.decision_type),
            )
            .supersedes(old_id);

        if let Some(rationale) = fields.rationale {
            builder = builder.rationale(rationale);
        }
        for option in fields.options {
            builder = builder.option(option);
        }
        if let Some(context) = fields.context {
            builder = builder.context(context);
        }
        for stakeholder in fields.stakeholders {
            builder = builder.stakeholder(stakeholder);
        }
        for (key, value) in fields.metadata {
            builder = builder.metadata_entry(key, value);
        }
        if let Some(policy) = fields.override_policy {
            builder = builder.override_policy(policy);
        }
        if let Some(precedence) = fields.precedence {
            builder = builder.precedence(precedence);
        }

        let replacement_draft = builder.build()?;
        let replacement = self.replace_active(&old, &replacement_draft)?;

        debug!(
            old = %old_id.short(),
            new = %replacement.id.short(),
            "superseded decision"
        );
        Ok(replacement)
    }

    /// Drives an explicit lifecycle transition and persists the result.
    pub fn set_status(&self, id: DecisionId, target: DecisionStatus) -> DecreeResult<Decision> {
        let decision = self.get(id)?;
        let updated = transition(&decision, target)?;
        self.store.save(&updated)?;
        Ok(updated)
    }

    /// Applies a partial update, enforcing post-activation immutability.
    pub fn update(&self, id: DecisionId, update: DecisionUpdate) -> DecreeResult<Decision> {
        let decision = self.get(id)?;
        let updated = apply_update(&decision, update)?;
        self.store.save(&updated)?;
        Ok(updated)
    }

    /// Imports a persisted record (either wire shape), validating it at the
    /// boundary before it can enter the store.
    pub fn import(&self, record: serde_json::Value) -> DecreeResult<Decision> {
        let decision = crate::schema::decode(record)?;
        self.store.save(&decision)?;
        Ok(decision)
    }
}
