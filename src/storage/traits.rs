//! Abstract storage trait for decree.
//!
//! The engine never assumes a storage technology; it operates through this
//! contract on already-loaded decision values. Two requirements are placed
//! on implementations rather than on the engine, because only the store can
//! make them atomic:
//!
//! - at most one active decision per (scope, binding key) — a colliding
//!   save must fail, not race;
//! - [`DecisionStore::save_atomic`] applies all writes or none, which is
//!   what makes supersession observable only as a single step.

use crate::decision::{Decision, DecisionId};
use crate::error::StorageError;

/// Storage contract for decision records.
pub trait DecisionStore: Send + Sync {
    /// All active decisions whose scope covers *scope*, in binding-set
    /// order (specificity, precedence, recency).
    fn load_active(&self, scope: &str) -> Result<Vec<Decision>, StorageError>;

    /// A decision by id, or `None`.
    fn load_by_id(&self, id: DecisionId) -> Result<Option<Decision>, StorageError>;

    /// Every stored decision, any status. Audit surface; no ordering
    /// guarantee beyond determinism for a fixed store state.
    fn load_all(&self) -> Result<Vec<Decision>, StorageError>;

    /// Inserts or replaces a decision by id.
    ///
    /// # Errors
    /// `DuplicateBindingKey` if the decision is active and another active
    /// decision already holds its (scope, binding key).
    fn save(&self, decision: &Decision) -> Result<(), StorageError>;

    /// Applies every write or none.
    ///
    /// Used by supersession: no observer may see the old decision
    /// superseded while the replacement is not yet active, or vice versa.
    fn save_atomic(&self, decisions: &[Decision]) -> Result<(), StorageError>;
}
