//! In-memory storage backend.
//!
//! Thread-safe reference implementation of [`DecisionStore`], intended for
//! embedded usage and tests. The (scope, binding key) uniqueness constraint
//! is enforced under the same write lock as the mutation itself, so two
//! concurrent colliding commits cannot both succeed.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::decision::{binding_order, Decision, DecisionId};
use crate::error::StorageError;
use crate::scope;
use crate::storage::traits::DecisionStore;

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// (scope, normalized binding key) under which an active decision is bound.
type BindingSlot = (String, String);

#[derive(Debug, Default)]
struct StoreState {
    by_id: HashMap<DecisionId, Decision>,
    /// Occupied binding slots, active decisions only.
    bindings: HashMap<BindingSlot, DecisionId>,
}

fn slot_of(decision: &Decision) -> BindingSlot {
    (
        decision.scope().to_string(),
        decision.binding_key().as_str().to_string(),
    )
}

/// Claims *decision*'s binding slot in *bindings*, failing on a collision
/// with a different active decision.
fn claim_slot(
    bindings: &mut HashMap<BindingSlot, DecisionId>,
    decision: &Decision,
) -> Result<(), StorageError> {
    if !decision.is_active() {
        return Ok(());
    }

    let slot = slot_of(decision);
    match bindings.get(&slot) {
        Some(existing) if *existing != decision.id => Err(StorageError::DuplicateBindingKey {
            scope: slot.0,
            binding_key: slot.1,
        }),
        _ => {
            bindings.insert(slot, decision.id);
            Ok(())
        }
    }
}

/// A copy of *bindings* with every slot held by a batch member removed; the
/// batch re-derives those slots from its own contents.
fn without_ids(
    bindings: &HashMap<BindingSlot, DecisionId>,
    ids: &[DecisionId],
) -> HashMap<BindingSlot, DecisionId> {
    bindings
        .iter()
        .filter(|(_, held_by)| !ids.contains(held_by))
        .map(|(slot, held_by)| (slot.clone(), *held_by))
        .collect()
}

/// Thread-safe in-memory decision store.
#[derive(Debug, Default)]
pub struct InMemoryDecisionStore {
    state: RwLock<StoreState>,
}

impl InMemoryDecisionStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored decisions, any status.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.state.read().map_err(|_| lock_err("len"))?.by_id.len())
    }

    /// Returns true if the store holds no decisions.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl DecisionStore for InMemoryDecisionStore {
    fn load_active(&self, target_scope: &str) -> Result<Vec<Decision>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("load_active"))?;

        let mut decisions: Vec<Decision> = state
            .by_id
            .values()
            .filter(|d| d.is_active() && scope::covers(d.scope(), target_scope))
            .cloned()
            .collect();
        decisions.sort_by(binding_order);
        Ok(decisions)
    }

    fn load_by_id(&self, id: DecisionId) -> Result<Option<Decision>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("load_by_id"))?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn load_all(&self) -> Result<Vec<Decision>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("load_all"))?;
        let mut decisions: Vec<Decision> = state.by_id.values().cloned().collect();
        decisions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
        });
        Ok(decisions)
    }

    fn save(&self, decision: &Decision) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("save"))?;

        let mut bindings = without_ids(&state.bindings, &[decision.id]);
        claim_slot(&mut bindings, decision)?;

        state.by_id.insert(decision.id, decision.clone());
        state.bindings = bindings;
        Ok(())
    }

    fn save_atomic(&self, decisions: &[Decision]) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("save_atomic"))?;

        // Validate the whole batch against an effective view before any
        // mutation lands; slots held by batch members are re-derived from
        // the batch itself (a supersession pair frees and re-claims its
        // slot as one unit).
        let batch_ids: Vec<DecisionId> = decisions.iter().map(|d| d.id).collect();
        let mut bindings = without_ids(&state.bindings, &batch_ids);
        for decision in decisions {
            claim_slot(&mut bindings, decision)?;
        }

        for decision in decisions {
            state.by_id.insert(decision.id, decision.clone());
        }
        state.bindings = bindings;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{DecisionStatus, DecisionType};
    use crate::lifecycle::transition;

    fn active_decision(title: &str, decision_scope: &str) -> Decision {
        let draft = Decision::builder()
            .title(title)
            .scope(decision_scope)
            .decision_type(DecisionType::Preference)
            .build()
            .unwrap();
        transition(&draft, DecisionStatus::Active).unwrap()
    }

    #[test]
    fn test_save_and_load_by_id() {
        let store = InMemoryDecisionStore::new();
        let decision = active_decision("use postgres", "repo:acme");

        store.save(&decision).unwrap();
        let loaded = store.load_by_id(decision.id).unwrap().unwrap();
        assert_eq!(loaded.id, decision.id);
        assert_eq!(loaded.title, decision.title);
    }

    #[test]
    fn test_load_by_id_missing() {
        let store = InMemoryDecisionStore::new();
        assert!(store.load_by_id(DecisionId::new()).unwrap().is_none());
    }

    #[test]
    fn test_load_active_filters_scope_and_status() {
        let store = InMemoryDecisionStore::new();
        let in_scope = active_decision("a", "repo:acme");
        let out_of_scope = active_decision("b", "repo:other");
        let draft = Decision::builder()
            .title("c")
            .scope("repo:acme")
            .decision_type(DecisionType::Preference)
            .build()
            .unwrap();

        store.save(&in_scope).unwrap();
        store.save(&out_of_scope).unwrap();
        store.save(&draft).unwrap();

        let active = store.load_active("repo:acme/folder:src").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, in_scope.id);
    }

    #[test]
    fn test_load_active_binding_set_order() {
        let store = InMemoryDecisionStore::new();
        let broad = active_decision("broad", "repo:acme");
        let narrow = active_decision("narrow", "repo:acme/folder:src");

        store.save(&broad).unwrap();
        store.save(&narrow).unwrap();

        let active = store.load_active("repo:acme/folder:src/api").unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, narrow.id);
        assert_eq!(active[1].id, broad.id);
    }

    #[test]
    fn test_duplicate_binding_key_rejected() {
        let store = InMemoryDecisionStore::new();
        let first = active_decision("production ready", "repo:acme");
        let second = active_decision("Production Ready", "repo:acme");

        store.save(&first).unwrap();
        let result = store.save(&second);
        assert!(matches!(
            result,
            Err(StorageError::DuplicateBindingKey { .. })
        ));
    }

    #[test]
    fn test_same_key_different_scope_allowed() {
        let store = InMemoryDecisionStore::new();
        store
            .save(&active_decision("production ready", "repo:acme"))
            .unwrap();
        store
            .save(&active_decision("production ready", "repo:other"))
            .unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_resave_same_decision_is_not_a_collision() {
        let store = InMemoryDecisionStore::new();
        let decision = active_decision("production ready", "repo:acme");

        store.save(&decision).unwrap();
        store.save(&decision).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_superseding_save_releases_binding_slot() {
        let store = InMemoryDecisionStore::new();
        let decision = active_decision("production ready", "repo:acme");
        store.save(&decision).unwrap();

        let superseded = transition(&decision, DecisionStatus::Superseded).unwrap();
        store.save(&superseded).unwrap();

        // Slot is free again for a replacement.
        let replacement = active_decision("production ready", "repo:acme");
        store.save(&replacement).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_save_atomic_all_or_nothing() {
        let store = InMemoryDecisionStore::new();
        let existing = active_decision("production ready", "repo:acme");
        store.save(&existing).unwrap();

        let fine = active_decision("another thing", "repo:acme");
        let colliding = active_decision("production ready", "repo:acme");

        let result = store.save_atomic(&[fine.clone(), colliding]);
        assert!(matches!(
            result,
            Err(StorageError::DuplicateBindingKey { .. })
        ));

        // Nothing from the failed batch landed.
        assert!(store.load_by_id(fine.id).unwrap().is_none());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_save_atomic_supersession_pair() {
        let store = InMemoryDecisionStore::new();
        let old = active_decision("production ready", "repo:acme");
        store.save(&old).unwrap();

        let superseded = transition(&old, DecisionStatus::Superseded).unwrap();
        let replacement = active_decision("production ready", "repo:acme");

        // The pair collides if applied one by one, but is valid as a unit.
        store
            .save_atomic(&[superseded.clone(), replacement.clone()])
            .unwrap();

        assert_eq!(
            store.load_by_id(old.id).unwrap().unwrap().status,
            DecisionStatus::Superseded
        );
        let active = store.load_active("repo:acme").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, replacement.id);
    }

    #[test]
    fn test_save_atomic_detects_collision_within_batch() {
        let store = InMemoryDecisionStore::new();
        let a = active_decision("production ready", "repo:acme");
        let b = active_decision("Production Ready", "repo:acme");

        let result = store.save_atomic(&[a, b]);
        assert!(matches!(
            result,
            Err(StorageError::DuplicateBindingKey { .. })
        ));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_load_all_includes_every_status() {
        let store = InMemoryDecisionStore::new();
        let active = active_decision("a", "repo:acme");
        let archived = transition(&active_decision("b", "repo:acme"), DecisionStatus::Archived)
            .unwrap();

        store.save(&active).unwrap();
        store.save(&archived).unwrap();

        assert_eq!(store.load_all().unwrap().len(), 2);
    }
}
