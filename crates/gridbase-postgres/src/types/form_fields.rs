//! Form field configuration stored on the `forms.form_fields` JSON column.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single field's presentation inside a public form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct FormField {
    /// The table field this form field maps to.
    pub field_id: Uuid,
    /// Optional label shown instead of the field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Whether a submission must provide this field.
    #[serde(default)]
    pub required: bool,
    /// Whether the field is rendered at all.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Display position within the form.
    #[serde(default)]
    pub position: i32,
}

fn default_visible() -> bool {
    true
}

impl FormField {
    /// Decodes the form-fields array from its JSON column representation.
    pub fn decode_list(raw: &serde_json::Value) -> Option<Vec<Self>> {
        serde_json::from_value(raw.clone()).ok()
    }

    /// Encodes a form-fields list for persistence.
    pub fn encode_list(fields: &[Self]) -> serde_json::Value {
        serde_json::to_value(fields).unwrap_or_else(|_| serde_json::json!([]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_defaults_missing_flags() {
        let field_id = Uuid::new_v4();
        let raw = serde_json::json!([{ "field_id": field_id }]);

        let fields = FormField::decode_list(&raw).unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields[0].visible);
        assert!(!fields[0].required);
        assert_eq!(fields[0].label, None);
    }

    #[test]
    fn encode_round_trips() {
        let field = FormField {
            field_id: Uuid::new_v4(),
            label: Some("Your name".to_string()),
            required: true,
            visible: true,
            position: 2,
        };

        let encoded = FormField::encode_list(std::slice::from_ref(&field));
        let decoded = FormField::decode_list(&encoded).unwrap();
        assert_eq!(decoded, vec![field]);
    }
}
