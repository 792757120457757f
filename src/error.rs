//! Error types for decree.
//!
//! All errors are strongly typed using thiserror. Expected outcomes
//! (no applicable decision, genuine ambiguity) are modeled as data, not
//! errors; only structural violations and disallowed mutations surface
//! through these types.

use thiserror::Error;

use crate::decision::{DecisionId, DecisionStatus};

/// Validation errors raised while checking a decision record against the
/// structural invariants, before it may enter the active set.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField { field: String },

    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Scope cannot be empty")]
    EmptyScope,

    #[error("Duplicate option id '{option_id}' in options_considered")]
    DuplicateOptionId { option_id: String },

    #[error("Malformed decision record: {reason}")]
    MalformedRecord { reason: String },
}

/// Lifecycle errors: disallowed status transitions and attempts to mutate
/// frozen fields after activation.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The requested status transition is not in the lifecycle graph.
    #[error("Cannot transition from '{from}' to '{to}'")]
    InvalidTransition {
        from: DecisionStatus,
        to: DecisionStatus,
    },

    /// A field frozen by activation was targeted by an update.
    #[error("Field '{field}' is immutable once a decision is active")]
    ImmutableField { field: String },
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Decision not found.
    #[error("Decision not found: {0}")]
    DecisionNotFound(DecisionId),

    /// A second active decision for the same (scope, binding key).
    #[error("Active decision already bound for scope '{scope}' and key '{binding_key}'")]
    DuplicateBindingKey { scope: String, binding_key: String },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Top-level error type for decree.
#[derive(Debug, Error)]
pub enum DecreeError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DecreeError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a lifecycle error.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Lifecycle(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if the error names a missing decision.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(StorageError::DecisionNotFound(_)))
    }
}

/// Result type alias for decree operations.
pub type DecreeResult<T> = Result<T, DecreeError>;
