//! Typed field options decoded from the `fields.options` JSON column.
//!
//! Options persist as opaque JSON at rest and are decoded into these tagged
//! variants on read. Unknown shapes at read time are an internal error, not
//! a user-visible one; user input is validated through [`FieldOptions::parse`]
//! before it is ever persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldType;

/// Error produced when field options fail validation for their type.
#[derive(Debug, thiserror::Error)]
pub enum FieldOptionsError {
    /// The options JSON did not match the shape required by the field type.
    #[error("invalid options for {field_type} field: {reason}")]
    InvalidShape {
        /// The declared field type.
        field_type: FieldType,
        /// Human-readable reason.
        reason: String,
    },
    /// A select field was configured without any choices.
    #[error("select fields require at least one choice")]
    EmptyChoices,
    /// A select field listed the same choice twice.
    #[error("duplicate select choice: {0}")]
    DuplicateChoice(String),
}

/// Choices for single- and multi-select fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectOptions {
    /// Allowed values, in display order.
    pub choices: Vec<String>,
}

/// Display options for number fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberOptions {
    /// Decimal places shown by clients; storage is always full precision.
    #[serde(default)]
    pub precision: Option<u8>,
}

/// Configuration for linked-record fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedRecordOptions {
    /// The table whose records this field links to.
    pub linked_table_id: Uuid,
}

/// Configuration for formula fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaOptions {
    /// Expression over sibling fields; field references use `{field_id}`.
    pub expression: String,
}

/// Aggregate applied by a rollup field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollupAggregate {
    Sum,
    Count,
    Min,
    Max,
}

/// Configuration for rollup fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupOptions {
    /// The linked-record field on this table to traverse.
    pub linked_field_id: Uuid,
    /// The field on the linked table to aggregate.
    pub target_field_id: Uuid,
    /// The aggregate to apply.
    pub aggregate: RollupAggregate,
}

/// Configuration for lookup fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOptions {
    /// The linked-record field on this table to traverse.
    pub linked_field_id: Uuid,
    /// The field on the linked table to project.
    pub target_field_id: Uuid,
}

/// Typed view of the `fields.options` column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOptions {
    /// Types that carry no configuration (text, checkbox, date, attachment).
    None,
    /// Number display options.
    Number(NumberOptions),
    /// Single- or multi-select choices.
    Select(SelectOptions),
    /// Linked-record target table.
    LinkedRecord(LinkedRecordOptions),
    /// Formula expression.
    Formula(FormulaOptions),
    /// Rollup traversal and aggregate.
    Rollup(RollupOptions),
    /// Lookup traversal.
    Lookup(LookupOptions),
}

impl FieldOptions {
    /// Validates and decodes raw options JSON for the given field type.
    ///
    /// # Errors
    ///
    /// Returns [`FieldOptionsError`] when the JSON does not satisfy the
    /// shape the field type requires.
    pub fn parse(
        field_type: FieldType,
        raw: &serde_json::Value,
    ) -> Result<Self, FieldOptionsError> {
        let invalid = |reason: String| FieldOptionsError::InvalidShape { field_type, reason };

        match field_type {
            FieldType::Text | FieldType::Checkbox | FieldType::Date | FieldType::Attachment => {
                Ok(Self::None)
            }
            FieldType::Number => {
                if raw.is_null() || raw == &serde_json::json!({}) {
                    return Ok(Self::Number(NumberOptions::default()));
                }
                let options: NumberOptions =
                    serde_json::from_value(raw.clone()).map_err(|e| invalid(e.to_string()))?;
                Ok(Self::Number(options))
            }
            FieldType::SingleSelect | FieldType::MultiSelect => {
                let options: SelectOptions =
                    serde_json::from_value(raw.clone()).map_err(|e| invalid(e.to_string()))?;

                if options.choices.is_empty() {
                    return Err(FieldOptionsError::EmptyChoices);
                }

                let mut seen = std::collections::HashSet::new();
                for choice in &options.choices {
                    if !seen.insert(choice.as_str()) {
                        return Err(FieldOptionsError::DuplicateChoice(choice.clone()));
                    }
                }

                Ok(Self::Select(options))
            }
            FieldType::LinkedRecord => {
                let options: LinkedRecordOptions =
                    serde_json::from_value(raw.clone()).map_err(|e| invalid(e.to_string()))?;
                Ok(Self::LinkedRecord(options))
            }
            FieldType::Formula => {
                let options: FormulaOptions =
                    serde_json::from_value(raw.clone()).map_err(|e| invalid(e.to_string()))?;
                if options.expression.trim().is_empty() {
                    return Err(invalid("expression must not be empty".to_string()));
                }
                Ok(Self::Formula(options))
            }
            FieldType::Rollup => {
                let options: RollupOptions =
                    serde_json::from_value(raw.clone()).map_err(|e| invalid(e.to_string()))?;
                Ok(Self::Rollup(options))
            }
            FieldType::Lookup => {
                let options: LookupOptions =
                    serde_json::from_value(raw.clone()).map_err(|e| invalid(e.to_string()))?;
                Ok(Self::Lookup(options))
            }
        }
    }

    /// Returns the select choices when this is a select configuration.
    pub fn choices(&self) -> Option<&[String]> {
        match self {
            Self::Select(options) => Some(&options.choices),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_types_accept_empty_options() {
        let parsed = FieldOptions::parse(FieldType::Text, &serde_json::json!({})).unwrap();
        assert_eq!(parsed, FieldOptions::None);
    }

    #[test]
    fn select_requires_choices() {
        let err = FieldOptions::parse(
            FieldType::SingleSelect,
            &serde_json::json!({"choices": []}),
        )
        .unwrap_err();
        assert!(matches!(err, FieldOptionsError::EmptyChoices));
    }

    #[test]
    fn select_rejects_duplicate_choices() {
        let err = FieldOptions::parse(
            FieldType::MultiSelect,
            &serde_json::json!({"choices": ["a", "b", "a"]}),
        )
        .unwrap_err();
        assert!(matches!(err, FieldOptionsError::DuplicateChoice(c) if c == "a"));
    }

    #[test]
    fn linked_record_requires_table() {
        let err =
            FieldOptions::parse(FieldType::LinkedRecord, &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, FieldOptionsError::InvalidShape { .. }));

        let table_id = Uuid::new_v4();
        let parsed = FieldOptions::parse(
            FieldType::LinkedRecord,
            &serde_json::json!({"linked_table_id": table_id}),
        )
        .unwrap();
        assert_eq!(
            parsed,
            FieldOptions::LinkedRecord(LinkedRecordOptions {
                linked_table_id: table_id
            })
        );
    }

    #[test]
    fn formula_rejects_empty_expression() {
        let err = FieldOptions::parse(
            FieldType::Formula,
            &serde_json::json!({"expression": "  "}),
        )
        .unwrap_err();
        assert!(matches!(err, FieldOptionsError::InvalidShape { .. }));
    }

    #[test]
    fn rollup_round_trips() {
        let linked = Uuid::new_v4();
        let target = Uuid::new_v4();
        let parsed = FieldOptions::parse(
            FieldType::Rollup,
            &serde_json::json!({
                "linked_field_id": linked,
                "target_field_id": target,
                "aggregate": "sum",
            }),
        )
        .unwrap();

        let FieldOptions::Rollup(options) = parsed else {
            panic!("expected rollup options");
        };
        assert_eq!(options.aggregate, RollupAggregate::Sum);
        assert_eq!(options.linked_field_id, linked);
        assert_eq!(options.target_field_id, target);
    }
}
