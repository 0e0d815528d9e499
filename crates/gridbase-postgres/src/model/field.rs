//! Field model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::fields;
use crate::types::FieldType;

/// A typed column of a table.
///
/// Options persist as opaque JSON and decode through
/// [`FieldOptions::parse`]; positions within a table form a permutation.
///
/// [`FieldOptions::parse`]: crate::types::FieldOptions::parse
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = fields)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Field {
    /// Unique field identifier.
    pub id: Uuid,
    /// The table this field belongs to.
    pub table_id: Uuid,
    /// Human-readable field name.
    pub display_name: String,
    /// The field's value type.
    pub field_type: FieldType,
    /// Type-specific options (choices, linked table, expression, ...).
    pub options: serde_json::Value,
    /// Display position within the table.
    pub position: i32,
    /// Timestamp when the field was created.
    pub created_at: Timestamp,
    /// Timestamp when the field was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new field.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = fields)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewField {
    /// The table this field belongs to.
    pub table_id: Uuid,
    /// Field name.
    pub display_name: String,
    /// The field's value type.
    pub field_type: FieldType,
    /// Type-specific options.
    pub options: serde_json::Value,
    /// Display position within the table.
    pub position: i32,
}

/// Data for updating a field.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = fields)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateField {
    /// New field name.
    pub display_name: Option<String>,
    /// New field type; only valid when compatible with existing values.
    pub field_type: Option<FieldType>,
    /// New type-specific options.
    pub options: Option<serde_json::Value>,
}
