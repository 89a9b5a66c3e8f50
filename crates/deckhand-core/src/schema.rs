// crates/deckhand-core/src/schema.rs
// ============================================================================
// Module: Deckhand Parameter Schemas
// Description: Declarative field descriptors and the Tier 2 validator.
// Purpose: Reject mistyped params with stable, field-naming messages.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Endpoint parameter schemas are ordered lists of field descriptors declared
//! at registry construction. Validation is fail-fast: the first offending
//! field produces a `BAD_REQUEST` naming the field and the violation. The
//! validator checks shape only; range and domain checks belong to handlers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::protocol::DomainError;
use crate::protocol::MAX_SAFE_INTEGER;

// ============================================================================
// SECTION: Field Types
// ============================================================================

/// Type tag for a schema field.
///
/// # Invariants
/// - Labels are stable; validation messages embed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// JSON string.
    String,
    /// JSON number with no fractional part within the 53-bit safe range.
    Integer,
    /// JSON `true` or `false`; numbers and strings are rejected.
    Boolean,
    /// JSON array.
    Array,
    /// JSON object.
    Table,
}

impl FieldType {
    /// Returns the label used in validation messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Table => "table",
        }
    }

    /// Returns true when the value matches the type tag.
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => is_safe_integer(value),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Table => value.is_object(),
        }
    }
}

/// Returns true for JSON numbers with no fractional part in the safe range.
fn is_safe_integer(value: &Value) -> bool {
    value
        .as_i64()
        .is_some_and(|n| (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&n))
}

// ============================================================================
// SECTION: Field Descriptors
// ============================================================================

/// Descriptor for a single schema field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name inside `params`.
    name: &'static str,
    /// Whether the field must be present.
    required: bool,
    /// Expected type tag.
    field_type: FieldType,
    /// Expected element type for `array` fields, when constrained.
    item_type: Option<FieldType>,
}

impl FieldSpec {
    /// Declares a required field.
    #[must_use]
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            required: true,
            field_type,
            item_type: None,
        }
    }

    /// Declares an optional field.
    #[must_use]
    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            required: false,
            field_type,
            item_type: None,
        }
    }

    /// Constrains the element type of an `array` field.
    #[must_use]
    pub const fn with_items(mut self, item_type: FieldType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    /// Validates a single present value against this descriptor.
    fn check(&self, value: &Value) -> Result<(), DomainError> {
        if !self.field_type.matches(value) {
            return Err(DomainError::bad_request(format!(
                "Field '{}' must be {} {}",
                self.name,
                article(self.field_type),
                self.field_type.label()
            )));
        }
        if let (Some(item_type), Value::Array(items)) = (self.item_type, value) {
            for (index, item) in items.iter().enumerate() {
                if !item_type.matches(item) {
                    return Err(DomainError::bad_request(format!(
                        "Field '{}' array item at index {index} must be of type {}",
                        self.name,
                        item_type.label()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Returns the indefinite article for a type label.
const fn article(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Integer | FieldType::Array => "an",
        FieldType::String | FieldType::Boolean | FieldType::Table => "a",
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Ordered parameter schema for one endpoint.
///
/// # Invariants
/// - Fields are validated in declaration order, fail-fast.
/// - Unknown `params` keys and missing optional fields are accepted.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Declared field descriptors in validation order.
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Creates an empty schema accepting any `params` object.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            fields: Vec::new(),
        }
    }

    /// Creates a schema from descriptors in validation order.
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
        }
    }

    /// Validates a `params` object against the schema.
    ///
    /// # Errors
    ///
    /// Returns a `BAD_REQUEST` [`DomainError`] naming the first offending
    /// field: a missing required field, a type mismatch, or a mistyped
    /// array element.
    pub fn validate(&self, params: &serde_json::Map<String, Value>) -> Result<(), DomainError> {
        for field in &self.fields {
            match params.get(field.name) {
                Some(value) => field.check(value)?,
                None if field.required => {
                    return Err(DomainError::bad_request(format!(
                        "Missing required field '{}'",
                        field.name
                    )));
                }
                None => {}
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions."
    )]

    use proptest::prelude::any;
    use proptest::prelude::prop_assert;
    use proptest::proptest;
    use serde_json::Value;
    use serde_json::json;

    use super::FieldSpec;
    use super::FieldType;
    use super::Schema;
    use crate::protocol::ErrorKind;

    fn params(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().expect("object literal").clone()
    }

    fn sample_schema() -> Schema {
        Schema::new(vec![
            FieldSpec::required("cards", FieldType::Array).with_items(FieldType::Integer),
            FieldSpec::required("name", FieldType::String),
            FieldSpec::optional("fast", FieldType::Boolean),
            FieldSpec::optional("count", FieldType::Integer),
            FieldSpec::optional("meta", FieldType::Table),
        ])
    }

    #[test]
    fn accepts_required_only() {
        let schema = sample_schema();
        let result = schema.validate(&params(json!({"cards": [1, 2], "name": "x"})));
        assert!(result.is_ok());
    }

    #[test]
    fn accepts_unknown_fields() {
        let schema = sample_schema();
        let result =
            schema.validate(&params(json!({"cards": [], "name": "x", "surplus": 1})));
        assert!(result.is_ok());
    }

    #[test]
    fn reports_missing_required_field() {
        let schema = sample_schema();
        let error = schema
            .validate(&params(json!({"name": "x"})))
            .expect_err("missing cards");
        assert_eq!(error.kind, ErrorKind::BadRequest);
        assert_eq!(error.message, "Missing required field 'cards'");
    }

    #[test]
    fn reports_array_type_mismatch() {
        let schema = sample_schema();
        let error = schema
            .validate(&params(json!({"cards": "INVALID", "name": "x"})))
            .expect_err("cards must be array");
        assert_eq!(error.message, "Field 'cards' must be an array");
    }

    #[test]
    fn reports_bad_array_item_with_index() {
        let schema = sample_schema();
        let error = schema
            .validate(&params(json!({"cards": [1, 2, "three", 4], "name": "x"})))
            .expect_err("mistyped element");
        assert_eq!(
            error.message,
            "Field 'cards' array item at index 2 must be of type integer"
        );
    }

    #[test]
    fn booleans_are_strict() {
        let schema = sample_schema();
        for bad in [json!(1), json!(0), json!("true"), json!("false")] {
            let result = schema
                .validate(&params(json!({"cards": [], "name": "x", "fast": bad})));
            assert!(result.is_err(), "boolean field accepted a non-boolean");
        }
        let result =
            schema.validate(&params(json!({"cards": [], "name": "x", "fast": true})));
        assert!(result.is_ok());
    }

    #[test]
    fn integers_are_strict() {
        let schema = sample_schema();
        for bad in [json!(42.5), json!("42"), json!(9_007_199_254_740_993_i64)] {
            let result = schema
                .validate(&params(json!({"cards": [], "name": "x", "count": bad})));
            assert!(result.is_err(), "integer field accepted a non-integer");
        }
        let result =
            schema.validate(&params(json!({"cards": [], "name": "x", "count": -3})));
        assert!(result.is_ok());
    }

    #[test]
    fn tables_reject_arrays() {
        let schema = sample_schema();
        let error = schema
            .validate(&params(json!({"cards": [], "name": "x", "meta": [1, 2]})))
            .expect_err("table must not be an array");
        assert_eq!(error.message, "Field 'meta' must be a table");
    }

    #[test]
    fn empty_schema_accepts_anything() {
        let schema = Schema::empty();
        assert!(schema.validate(&params(json!({"whatever": [1, {"a": 1}]}))).is_ok());
    }

    proptest! {
        #[test]
        fn integer_fields_accept_all_safe_integers(n in -(1_i64 << 53) + 1..(1_i64 << 53)) {
            let schema = Schema::new(vec![FieldSpec::required("n", FieldType::Integer)]);
            let value = json!({"n": n});
            let result = schema.validate(&params(value));
            prop_assert!(result.is_ok());
        }

        #[test]
        fn boolean_fields_reject_all_strings(s in any::<String>()) {
            let schema = Schema::new(vec![FieldSpec::required("b", FieldType::Boolean)]);
            let value = json!({"b": s});
            let result = schema.validate(&params(value));
            prop_assert!(result.is_err());
        }
    }
}
