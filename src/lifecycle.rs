//! Deterministic lifecycle state machine for decisions.
//!
//! Status moves only along `draft → active → superseded → archived` (with
//! `active → archived` as a shortcut); everything else is rejected. Entering
//! `active` freezes the decision's identity fields: `id`, `title`,
//! `options_considered`, `context`, `decision_type`, and `scope`. Both
//! [`transition`] and [`apply_update`] are pure functions over an input
//! value; a failed attempt leaves the input untouched.

use chrono::Utc;
use serde_json::Value;

use crate::decision::{ConsideredOption, Decision, DecisionContext, DecisionStatus};
use crate::error::LifecycleError;

/// Returns true if `from → to` is a valid lifecycle transition.
#[must_use]
pub const fn can_transition(from: DecisionStatus, to: DecisionStatus) -> bool {
    matches!(
        (from, to),
        (DecisionStatus::Draft, DecisionStatus::Active)
            | (DecisionStatus::Active, DecisionStatus::Superseded)
            | (DecisionStatus::Active, DecisionStatus::Archived)
            | (DecisionStatus::Superseded, DecisionStatus::Archived)
    )
}

/// Applies a status transition, returning the updated decision value.
///
/// On success the result carries the new status, a bumped `version`, and a
/// fresh `updated_at`; every other field is byte-for-byte the input's. On
/// failure the exact disallowed `(from, to)` pair is reported.
pub fn transition(
    decision: &Decision,
    target: DecisionStatus,
) -> Result<Decision, LifecycleError> {
    if !can_transition(decision.status, target) {
        return Err(LifecycleError::InvalidTransition {
            from: decision.status,
            to: target,
        });
    }

    let mut updated = decision.clone();
    updated.status = target;
    updated.version += 1;
    updated.updated_at = Utc::now();
    Ok(updated)
}

/// A partial update to a decision's mutable surface.
///
/// `title`, `options_considered`, and `context` are representable so a
/// post-activation attempt can be rejected naming the exact field. The
/// remaining frozen fields (`id`, `scope`, `decision_type`) are
/// deliberately unrepresentable here: those freezes hold at the type level
/// and need no runtime check.
#[derive(Debug, Clone, Default)]
pub struct DecisionUpdate {
    /// Replacement title (frozen once active).
    pub title: Option<String>,
    /// Replacement options list (frozen once active).
    pub options_considered: Option<Vec<ConsideredOption>>,
    /// Replacement context (frozen once active).
    pub context: Option<DecisionContext>,
    /// Replacement rationale (always mutable).
    pub rationale: Option<String>,
    /// Metadata entries to merge in (always mutable).
    pub metadata: Vec<(String, Value)>,
}

impl DecisionUpdate {
    /// An update that only merges metadata entries.
    #[must_use]
    pub fn metadata_only(entries: Vec<(String, Value)>) -> Self {
        Self {
            metadata: entries,
            ..Self::default()
        }
    }

    fn is_noop(&self) -> bool {
        self.title.is_none()
            && self.options_considered.is_none()
            && self.context.is_none()
            && self.rationale.is_none()
            && self.metadata.is_empty()
    }
}

/// Applies a partial update, enforcing post-activation immutability.
///
/// For a decision that has left `draft`, any update touching `title`,
/// `options_considered`, or `context` fails with
/// [`LifecycleError::ImmutableField`] naming the offending field. `id`,
/// `scope`, and `decision_type` cannot be expressed in a
/// [`DecisionUpdate`] at all, so no runtime guard exists for them. Applied
/// updates bump `version` and `updated_at`.
pub fn apply_update(
    decision: &Decision,
    update: DecisionUpdate,
) -> Result<Decision, LifecycleError> {
    let frozen = decision.status != DecisionStatus::Draft;

    if frozen {
        if update.title.is_some() {
            return Err(LifecycleError::ImmutableField {
                field: "title".to_string(),
            });
        }
        if update.options_considered.is_some() {
            return Err(LifecycleError::ImmutableField {
                field: "options_considered".to_string(),
            });
        }
        if update.context.is_some() {
            return Err(LifecycleError::ImmutableField {
                field: "context".to_string(),
            });
        }
    }

    if update.is_noop() {
        return Ok(decision.clone());
    }

    let mut updated = decision.clone();
    if let Some(title) = update.title {
        updated.title = title;
    }
    if let Some(options) = update.options_considered {
        updated.options_considered = options;
    }
    if let Some(context) = update.context {
        updated.context = Some(context);
    }
    if let Some(rationale) = update.rationale {
        updated.rationale = Some(rationale);
    }
    for (key, value) in update.metadata {
        updated.metadata.insert(key, value);
    }

    updated.version += 1;
    updated.updated_at = Utc::now();
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionType;

    fn draft() -> Decision {
        Decision::builder()
            .title("Use PostgreSQL")
            .scope("repo:acme")
            .decision_type(DecisionType::Rejection)
            .build()
            .unwrap()
    }

    fn active() -> Decision {
        transition(&draft(), DecisionStatus::Active).unwrap()
    }

    #[test]
    fn test_valid_transitions() {
        let d = draft();
        let a = transition(&d, DecisionStatus::Active).unwrap();
        assert_eq!(a.status, DecisionStatus::Active);
        assert_eq!(a.version, d.version + 1);

        let s = transition(&a, DecisionStatus::Superseded).unwrap();
        assert_eq!(s.status, DecisionStatus::Superseded);

        let z = transition(&s, DecisionStatus::Archived).unwrap();
        assert_eq!(z.status, DecisionStatus::Archived);

        let z2 = transition(&a, DecisionStatus::Archived).unwrap();
        assert_eq!(z2.status, DecisionStatus::Archived);
    }

    #[test]
    fn test_invalid_transitions_each_rejected() {
        let d = draft();
        let a = active();
        let s = transition(&a, DecisionStatus::Superseded).unwrap();
        let z = transition(&a, DecisionStatus::Archived).unwrap();

        let cases: Vec<(&Decision, DecisionStatus)> = vec![
            (&a, DecisionStatus::Draft),
            (&s, DecisionStatus::Active),
            (&s, DecisionStatus::Draft),
            (&z, DecisionStatus::Draft),
            (&z, DecisionStatus::Active),
            (&z, DecisionStatus::Superseded),
            (&d, DecisionStatus::Superseded),
            (&d, DecisionStatus::Archived),
        ];

        for (decision, target) in cases {
            let result = transition(decision, target);
            match result {
                Err(LifecycleError::InvalidTransition { from, to }) => {
                    assert_eq!(from, decision.status);
                    assert_eq!(to, target);
                }
                other => panic!("expected InvalidTransition, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_self_transition_rejected() {
        let a = active();
        assert!(transition(&a, DecisionStatus::Active).is_err());
    }

    #[test]
    fn test_failed_transition_leaves_input_unchanged() {
        let a = active();
        let snapshot = serde_json::to_value(&a).unwrap();

        let _ = transition(&a, DecisionStatus::Draft);

        assert_eq!(serde_json::to_value(&a).unwrap(), snapshot);
    }

    #[test]
    fn test_transition_changes_only_status_version_updated_at() {
        let d = draft();
        let a = transition(&d, DecisionStatus::Active).unwrap();

        assert_eq!(a.id, d.id);
        assert_eq!(a.title, d.title);
        assert_eq!(a.options_considered, d.options_considered);
        assert_eq!(a.enforcement, d.enforcement);
        assert_eq!(a.created_at, d.created_at);
        assert!(a.updated_at >= d.updated_at);
    }

    #[test]
    fn test_update_draft_allows_everything() {
        let d = draft();
        let updated = apply_update(
            &d,
            DecisionUpdate {
                title: Some("Use CockroachDB".to_string()),
                rationale: Some("serializable by default".to_string()),
                ..DecisionUpdate::default()
            },
        )
        .unwrap();

        assert_eq!(updated.title, "Use CockroachDB");
        assert_eq!(updated.version, d.version + 1);
    }

    #[test]
    fn test_update_active_rejects_frozen_fields() {
        let a = active();

        let title = apply_update(
            &a,
            DecisionUpdate {
                title: Some("x".to_string()),
                ..DecisionUpdate::default()
            },
        );
        assert!(matches!(
            title,
            Err(LifecycleError::ImmutableField { ref field }) if field == "title"
        ));

        let options = apply_update(
            &a,
            DecisionUpdate {
                options_considered: Some(vec![]),
                ..DecisionUpdate::default()
            },
        );
        assert!(matches!(
            options,
            Err(LifecycleError::ImmutableField { ref field }) if field == "options_considered"
        ));

        let context = apply_update(
            &a,
            DecisionUpdate {
                context: Some(DecisionContext {
                    trigger: "t".to_string(),
                    source: "s".to_string(),
                    timestamp: Utc::now(),
                    actor: None,
                }),
                ..DecisionUpdate::default()
            },
        );
        assert!(matches!(
            context,
            Err(LifecycleError::ImmutableField { ref field }) if field == "context"
        ));
    }

    #[test]
    fn test_update_active_allows_metadata() {
        let a = active();
        let updated = apply_update(
            &a,
            DecisionUpdate::metadata_only(vec![(
                "reviewed_by".to_string(),
                serde_json::json!("alice"),
            )]),
        )
        .unwrap();

        assert_eq!(updated.metadata["reviewed_by"], serde_json::json!("alice"));
        assert_eq!(updated.version, a.version + 1);
        assert_eq!(updated.title, a.title);
    }

    #[test]
    fn test_failed_update_leaves_input_unchanged() {
        let a = active();
        let snapshot = serde_json::to_value(&a).unwrap();

        let _ = apply_update(
            &a,
            DecisionUpdate {
                title: Some("x".to_string()),
                ..DecisionUpdate::default()
            },
        );

        assert_eq!(serde_json::to_value(&a).unwrap(), snapshot);
    }

    #[test]
    fn test_noop_update_does_not_bump_version() {
        let a = active();
        let updated = apply_update(&a, DecisionUpdate::default()).unwrap();
        assert_eq!(updated.version, a.version);
    }
}
