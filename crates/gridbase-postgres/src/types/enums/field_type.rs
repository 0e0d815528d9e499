//! Field type enumeration for table columns.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The type of a table field.
///
/// Corresponds to the `FIELD_TYPE` PostgreSQL enum. Computed types
/// (formula, rollup, lookup) derive their values from other fields and
/// reject direct writes.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::FieldType"]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldType {
    /// Free-form text.
    #[db_rename = "text"]
    #[default]
    Text,
    /// Floating-point number.
    #[db_rename = "number"]
    Number,
    /// Boolean checkbox.
    #[db_rename = "checkbox"]
    Checkbox,
    /// Calendar date without a time component.
    #[db_rename = "date"]
    Date,
    /// One choice out of a configured set.
    #[db_rename = "single_select"]
    SingleSelect,
    /// Any subset of a configured set.
    #[db_rename = "multi_select"]
    MultiSelect,
    /// References to records in a linked table.
    #[db_rename = "linked_record"]
    LinkedRecord,
    /// Value computed from an expression over sibling fields.
    #[db_rename = "formula"]
    Formula,
    /// Aggregate over a field of linked records.
    #[db_rename = "rollup"]
    Rollup,
    /// Projection of a field through a linked-record field.
    #[db_rename = "lookup"]
    Lookup,
    /// File attachments stored in object storage.
    #[db_rename = "attachment"]
    Attachment,
}

impl FieldType {
    /// Returns whether values of this type are derived rather than written.
    #[inline]
    pub const fn is_computed(self) -> bool {
        matches!(self, Self::Formula | Self::Rollup | Self::Lookup)
    }

    /// Returns whether this type requires configured options to be valid.
    #[inline]
    pub const fn requires_options(self) -> bool {
        matches!(
            self,
            Self::SingleSelect
                | Self::MultiSelect
                | Self::LinkedRecord
                | Self::Formula
                | Self::Rollup
                | Self::Lookup
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn computed_types() {
        assert!(FieldType::Formula.is_computed());
        assert!(FieldType::Rollup.is_computed());
        assert!(FieldType::Lookup.is_computed());
        assert!(!FieldType::Text.is_computed());
        assert!(!FieldType::LinkedRecord.is_computed());
    }

    #[test]
    fn parses_snake_case() {
        assert_eq!(
            FieldType::from_str("single_select").unwrap(),
            FieldType::SingleSelect
        );
        assert!(FieldType::from_str("telephone").is_err());
    }

    #[test]
    fn select_types_require_options() {
        assert!(FieldType::SingleSelect.requires_options());
        assert!(!FieldType::Checkbox.requires_options());
    }
}
