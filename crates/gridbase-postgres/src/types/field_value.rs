//! Typed record cell values decoded from the `records.values` JSON column.
//!
//! Record values persist as an opaque JSON object keyed by field id. Writes
//! go through [`FieldValue::parse`], the single per-type validation choke
//! point; reads expose the raw JSON and decode lazily where the domain needs
//! typed access (automations, CSV export, computed-field evaluation).

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FieldOptions, FieldType};

/// Error produced when a cell value fails validation for its field type.
#[derive(Debug, thiserror::Error)]
pub enum FieldValueError {
    /// The JSON value does not match the field type.
    #[error("value does not match {field_type} field: {reason}")]
    TypeMismatch {
        /// The field's declared type.
        field_type: FieldType,
        /// Human-readable reason.
        reason: String,
    },
    /// A select value is not one of the configured choices.
    #[error("\"{0}\" is not a configured choice")]
    UnknownChoice(String),
    /// A computed field received a direct write.
    #[error("{0} fields are computed and cannot be written")]
    ComputedField(FieldType),
}

/// A validated, typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text cell.
    Text(String),
    /// Number cell; stored as JSON number.
    Number(f64),
    /// Checkbox cell.
    Checkbox(bool),
    /// Date cell; stored as `YYYY-MM-DD`.
    Date(Date),
    /// Multi-select or linked-record or attachment list cell.
    List(Vec<serde_json::Value>),
}

impl FieldValue {
    /// Validates a raw JSON value against a field's type and options.
    ///
    /// Returns `Ok(None)` for JSON `null`, which clears the cell. Computed
    /// field types reject all direct writes.
    ///
    /// # Errors
    ///
    /// Returns [`FieldValueError`] when the value does not fit the type.
    pub fn parse(
        field_type: FieldType,
        options: &FieldOptions,
        raw: &serde_json::Value,
    ) -> Result<Option<Self>, FieldValueError> {
        if field_type.is_computed() {
            return Err(FieldValueError::ComputedField(field_type));
        }

        if raw.is_null() {
            return Ok(None);
        }

        let mismatch = |reason: &str| FieldValueError::TypeMismatch {
            field_type,
            reason: reason.to_string(),
        };

        match field_type {
            FieldType::Text => raw
                .as_str()
                .map(|s| Some(Self::Text(s.to_string())))
                .ok_or_else(|| mismatch("expected a string")),
            FieldType::Number => {
                let number = raw.as_f64().ok_or_else(|| mismatch("expected a number"))?;
                if !number.is_finite() {
                    return Err(mismatch("expected a finite number"));
                }
                Ok(Some(Self::Number(number)))
            }
            FieldType::Checkbox => raw
                .as_bool()
                .map(|b| Some(Self::Checkbox(b)))
                .ok_or_else(|| mismatch("expected a boolean")),
            FieldType::Date => {
                let text = raw.as_str().ok_or_else(|| mismatch("expected a date string"))?;
                let date: Date = text
                    .parse()
                    .map_err(|_| mismatch("expected YYYY-MM-DD"))?;
                Ok(Some(Self::Date(date)))
            }
            FieldType::SingleSelect => {
                let text = raw.as_str().ok_or_else(|| mismatch("expected a string"))?;
                let choices = options.choices().unwrap_or_default();
                if !choices.iter().any(|c| c == text) {
                    return Err(FieldValueError::UnknownChoice(text.to_string()));
                }
                Ok(Some(Self::Text(text.to_string())))
            }
            FieldType::MultiSelect => {
                let items = raw
                    .as_array()
                    .ok_or_else(|| mismatch("expected an array of strings"))?;
                let choices = options.choices().unwrap_or_default();

                for item in items {
                    let text = item
                        .as_str()
                        .ok_or_else(|| mismatch("expected an array of strings"))?;
                    if !choices.iter().any(|c| c == text) {
                        return Err(FieldValueError::UnknownChoice(text.to_string()));
                    }
                }

                Ok(Some(Self::List(items.clone())))
            }
            FieldType::LinkedRecord | FieldType::Attachment => {
                let items = raw
                    .as_array()
                    .ok_or_else(|| mismatch("expected an array of record ids"))?;

                for item in items {
                    let text = item
                        .as_str()
                        .ok_or_else(|| mismatch("expected an array of ids"))?;
                    Uuid::parse_str(text).map_err(|_| mismatch("expected UUID entries"))?;
                }

                Ok(Some(Self::List(items.clone())))
            }
            FieldType::Formula | FieldType::Rollup | FieldType::Lookup => {
                unreachable!("computed types handled above")
            }
        }
    }

    /// Converts this value back into its JSON wire representation.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::Text(text) => serde_json::Value::String(text),
            Self::Number(number) => serde_json::json!(number),
            Self::Checkbox(flag) => serde_json::Value::Bool(flag),
            Self::Date(date) => serde_json::Value::String(date.to_string()),
            Self::List(items) => serde_json::Value::Array(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SelectOptions;

    fn select_options(choices: &[&str]) -> FieldOptions {
        FieldOptions::Select(SelectOptions {
            choices: choices.iter().map(|c| c.to_string()).collect(),
        })
    }

    #[test]
    fn null_clears_the_cell() {
        let value =
            FieldValue::parse(FieldType::Text, &FieldOptions::None, &serde_json::Value::Null)
                .unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn text_accepts_strings_only() {
        let ok = FieldValue::parse(FieldType::Text, &FieldOptions::None, &serde_json::json!("hi"))
            .unwrap();
        assert_eq!(ok, Some(FieldValue::Text("hi".to_string())));

        let err =
            FieldValue::parse(FieldType::Text, &FieldOptions::None, &serde_json::json!(42));
        assert!(err.is_err());
    }

    #[test]
    fn number_rejects_non_finite() {
        let ok =
            FieldValue::parse(FieldType::Number, &FieldOptions::None, &serde_json::json!(4.5))
                .unwrap();
        assert_eq!(ok, Some(FieldValue::Number(4.5)));

        let err = FieldValue::parse(
            FieldType::Number,
            &FieldOptions::None,
            &serde_json::json!("42"),
        );
        assert!(err.is_err());
    }

    #[test]
    fn date_requires_iso_format() {
        let ok = FieldValue::parse(
            FieldType::Date,
            &FieldOptions::None,
            &serde_json::json!("2025-03-14"),
        )
        .unwrap();
        assert!(matches!(ok, Some(FieldValue::Date(_))));

        let err = FieldValue::parse(
            FieldType::Date,
            &FieldOptions::None,
            &serde_json::json!("03/14/2025"),
        );
        assert!(err.is_err());
    }

    #[test]
    fn single_select_checks_choices() {
        let options = select_options(&["todo", "done"]);

        let ok =
            FieldValue::parse(FieldType::SingleSelect, &options, &serde_json::json!("todo"))
                .unwrap();
        assert_eq!(ok, Some(FieldValue::Text("todo".to_string())));

        let err =
            FieldValue::parse(FieldType::SingleSelect, &options, &serde_json::json!("wip"));
        assert!(matches!(err, Err(FieldValueError::UnknownChoice(c)) if c == "wip"));
    }

    #[test]
    fn multi_select_checks_every_choice() {
        let options = select_options(&["a", "b"]);
        let err = FieldValue::parse(
            FieldType::MultiSelect,
            &options,
            &serde_json::json!(["a", "c"]),
        );
        assert!(matches!(err, Err(FieldValueError::UnknownChoice(c)) if c == "c"));
    }

    #[test]
    fn linked_record_requires_uuid_entries() {
        let id = Uuid::new_v4();
        let ok = FieldValue::parse(
            FieldType::LinkedRecord,
            &FieldOptions::None,
            &serde_json::json!([id.to_string()]),
        )
        .unwrap();
        assert!(ok.is_some());

        let err = FieldValue::parse(
            FieldType::LinkedRecord,
            &FieldOptions::None,
            &serde_json::json!(["not-a-uuid"]),
        );
        assert!(err.is_err());
    }

    #[test]
    fn computed_fields_reject_writes() {
        let err = FieldValue::parse(
            FieldType::Formula,
            &FieldOptions::None,
            &serde_json::json!(1),
        );
        assert!(matches!(err, Err(FieldValueError::ComputedField(_))));
    }

    #[test]
    fn json_round_trip() {
        let value = FieldValue::Date("2024-12-31".parse().unwrap());
        assert_eq!(value.into_json(), serde_json::json!("2024-12-31"));
    }
}
