//! # Decree - A Decision Lifecycle and Enforcement Engine
//!
//! Decree keeps a team's settled decisions machine-readable and binding. A
//! [`Decision`] captures what was decided, what was rejected, and where the
//! outcome applies; once committed it is immutable in its identity fields and
//! can only be replaced by atomic supersession. The engine then answers three
//! questions deterministically: which decisions bind a scope (`inspect`),
//! whether a query is already settled (`resolve`), and whether a proposed
//! action violates anything (`enforce`).
//!
//! ## Core Concepts
//!
//! - **Decision**: An immutable-once-active record binding a title, the
//!   options considered, and an enforcement scope
//! - **Scope**: A hierarchical path (`repo:acme/folder:src`) under which a
//!   decision binds; broader scopes cover narrower ones
//! - **Binding key**: The normalized identity under which at most one active
//!   decision may exist per scope
//! - **Verdict**: The enforcement outcome for a proposed action (`allow`,
//!   `confirm`, or `block`)
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use decree::decision::{ConsideredOption, DecisionType};
//! use decree::enforce::{Action, ActionType, Verdict};
//! use decree::operations::CommitBuilder;
//! use decree::storage::InMemoryDecisionStore;
//! use decree::DecreeEngine;
//!
//! # fn main() -> decree::DecreeResult<()> {
//! let engine = DecreeEngine::new(Arc::new(InMemoryDecisionStore::new()));
//!
//! // Commit a decision rejecting MongoDB for this repo.
//! engine.commit(
//!     CommitBuilder::new()
//!         .title("Use PostgreSQL for persistence")
//!         .scope("repo:acme")
//!         .decision_type(DecisionType::Rejection)
//!         .option(ConsideredOption::selected("PostgreSQL"))
//!         .option(ConsideredOption::rejected("MongoDB", None))
//!         .build()?,
//! )?;
//!
//! // A later action that reaches for the rejected option is blocked.
//! let action = Action::new(ActionType::CodeChange, "use MongoDB for sessions", "repo:acme/folder:src");
//! let result = engine.enforce(&action)?;
//! assert_eq!(result.verdict, Verdict::Block);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod binding;
pub mod decision;
pub mod error;
pub mod lifecycle;
pub mod scope;

// Evaluation
pub mod enforce;
pub mod resolve;

// Engine, storage, and operations
pub mod engine;
pub mod hooks;
pub mod operations;
pub mod schema;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use binding::BindingKey;
pub use decision::{
    ConsideredOption, Decision, DecisionContext, DecisionId, DecisionStatus, DecisionType,
    Enforcement, OverridePolicy,
};
pub use engine::{DecreeEngine, EngineConfig};
pub use enforce::{
    Action, ActionType, ConflictRecord, EnforcementEngine, EnforcementResult, RejectionMatcher,
    Verdict, WordBoundaryMatcher,
};
pub use error::{DecreeError, DecreeResult, LifecycleError, StorageError, ValidationError};
pub use hooks::{
    AmbiguityScorer, DecisionCompiler, NoopAmbiguityScorer, NoopDecisionCompiler, NoopRiskScorer,
    RiskLevel, RiskScorer, Rule,
};
pub use lifecycle::{apply_update, can_transition, transition, DecisionUpdate};
pub use operations::{CommitBuilder, CommitPayload, SupersedeFields};
pub use resolve::{Candidate, ClarificationRequest, ResolveOutcome};
pub use storage::{DecisionStore, InMemoryDecisionStore};
