//! Persisted decision format.
//!
//! Two wire shapes map onto one canonical in-memory [`Decision`]:
//!
//! - **v0.2** (canonical): enforcement fields nested under `enforcement`.
//! - **v0.1** (legacy): `scope`, `decision_type`, `override_policy`,
//!   `precedence`, and `supersedes` at the top level.
//!
//! Migration is a pure function applied once at the load boundary; the rest
//! of the engine only ever sees the canonical shape. Unknown additive fields
//! are tolerated, structural violations are not.

use serde_json::Value;

use crate::decision::Decision;
use crate::error::ValidationError;

/// Fields that moved under `enforcement` between v0.1 and v0.2.
const LEGACY_ENFORCEMENT_FIELDS: [&str; 5] = [
    "scope",
    "decision_type",
    "supersedes",
    "precedence",
    "override_policy",
];

fn malformed(reason: impl Into<String>) -> ValidationError {
    ValidationError::MalformedRecord {
        reason: reason.into(),
    }
}

/// Returns true if *value* is a legacy v0.1 record (flat enforcement
/// fields, no nested `enforcement` object).
#[must_use]
pub fn is_legacy(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    !object.contains_key("enforcement") && object.contains_key("scope")
}

/// Migrates a legacy v0.1 object to the canonical v0.2 shape.
///
/// Pure: the input is consumed and a rewritten value returned; non-legacy
/// input passes through unchanged.
#[must_use]
pub fn migrate(mut value: Value) -> Value {
    if !is_legacy(&value) {
        return value;
    }

    let Some(object) = value.as_object_mut() else {
        return value;
    };

    let mut enforcement = serde_json::Map::new();
    for field in LEGACY_ENFORCEMENT_FIELDS {
        if let Some(v) = object.remove(field) {
            if !v.is_null() {
                enforcement.insert(field.to_string(), v);
            }
        }
    }
    object.insert("enforcement".to_string(), Value::Object(enforcement));

    value
}

/// Decodes a persisted JSON value into a validated [`Decision`].
///
/// Accepts both wire shapes, migrating v0.1 first. The structural
/// invariants are checked here, before the record can enter any store.
pub fn decode(value: Value) -> Result<Decision, ValidationError> {
    let canonical = migrate(value);
    let decision: Decision =
        serde_json::from_value(canonical).map_err(|e| malformed(e.to_string()))?;
    decision.validate()?;
    Ok(decision)
}

/// Decodes a persisted JSON string; see [`decode`].
pub fn decode_str(json: &str) -> Result<Decision, ValidationError> {
    let value: Value = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;
    decode(value)
}

/// Encodes a decision into the canonical v0.2 JSON value.
pub fn encode(decision: &Decision) -> Result<Value, ValidationError> {
    serde_json::to_value(decision).map_err(|e| malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{ConsideredOption, DecisionType, OverridePolicy};

    fn canonical_decision() -> Decision {
        Decision::builder()
            .title("Use PostgreSQL")
            .scope("repo:acme")
            .decision_type(DecisionType::Rejection)
            .option(ConsideredOption::rejected("MongoDB", None))
            .precedence(7)
            .build()
            .unwrap()
    }

    fn legacy_record() -> Value {
        serde_json::json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "version": 0,
            "status": "active",
            "title": "Use PostgreSQL",
            "scope": "repo:acme",
            "decision_type": "rejection",
            "override_policy": "warn",
            "precedence": 7,
            "stakeholders": [],
            "metadata": {},
            "created_at": "2024-06-01T00:00:00Z",
            "updated_at": "2024-06-01T00:00:00Z"
        })
    }

    #[test]
    fn test_canonical_round_trip() {
        let decision = canonical_decision();
        let value = encode(&decision).unwrap();
        let back = decode(value).unwrap();

        assert_eq!(decision.id, back.id);
        assert_eq!(decision.title, back.title);
        assert_eq!(decision.enforcement, back.enforcement);
        assert_eq!(decision.options_considered, back.options_considered);
        assert_eq!(decision.created_at, back.created_at);
    }

    #[test]
    fn test_is_legacy_detection() {
        assert!(is_legacy(&legacy_record()));
        assert!(!is_legacy(&encode(&canonical_decision()).unwrap()));
        assert!(!is_legacy(&serde_json::json!("not an object")));
    }

    #[test]
    fn test_migrate_nests_enforcement_fields() {
        let migrated = migrate(legacy_record());
        let enforcement = &migrated["enforcement"];

        assert_eq!(enforcement["scope"], "repo:acme");
        assert_eq!(enforcement["decision_type"], "rejection");
        assert_eq!(enforcement["override_policy"], "warn");
        assert_eq!(enforcement["precedence"], 7);
        assert!(migrated.get("scope").is_none());
        assert!(migrated.get("decision_type").is_none());
    }

    #[test]
    fn test_decode_legacy_record() {
        let decision = decode(legacy_record()).unwrap();
        assert_eq!(decision.enforcement.scope, "repo:acme");
        assert_eq!(decision.enforcement.decision_type, DecisionType::Rejection);
        assert_eq!(decision.enforcement.override_policy, OverridePolicy::Warn);
        assert_eq!(decision.enforcement.precedence, Some(7));
    }

    #[test]
    fn test_migrate_is_pure_passthrough_for_canonical() {
        let value = encode(&canonical_decision()).unwrap();
        assert_eq!(migrate(value.clone()), value);
    }

    #[test]
    fn test_decode_tolerates_additive_fields() {
        let mut record = legacy_record();
        record
            .as_object_mut()
            .unwrap()
            .insert("schema_hint".to_string(), serde_json::json!("v0.1"));

        assert!(decode(record).is_ok());
    }

    #[test]
    fn test_decode_rejects_bad_enum_value() {
        let mut record = legacy_record();
        record["decision_type"] = serde_json::json!("vibes");

        let result = decode(record);
        assert!(matches!(
            result,
            Err(ValidationError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_missing_required_field() {
        let mut record = legacy_record();
        record.as_object_mut().unwrap().remove("title");

        assert!(decode(record).is_err());
    }

    #[test]
    fn test_decode_rejects_duplicate_option_ids() {
        let mut record = legacy_record();
        record.as_object_mut().unwrap().insert(
            "options_considered".to_string(),
            serde_json::json!([
                {"id": "opt_1", "title": "A", "selected": true},
                {"id": "opt_1", "title": "B", "selected": false}
            ]),
        );

        let result = decode(record);
        assert!(matches!(
            result,
            Err(ValidationError::DuplicateOptionId { .. })
        ));
    }

    #[test]
    fn test_decode_str_rejects_invalid_json() {
        assert!(decode_str("{not json").is_err());
    }
}
