//! Record model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::records;

/// A row in a table whose cells are keyed by field id.
///
/// The `values` object holds only keys that are field ids of the table at
/// write time; values are validated through [`FieldValue::parse`] before
/// persistence.
///
/// [`FieldValue::parse`]: crate::types::FieldValue::parse
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Record {
    /// Unique record identifier.
    pub id: Uuid,
    /// The table this record belongs to.
    pub table_id: Uuid,
    /// Cell values keyed by field id.
    pub values: serde_json::Value,
    /// Optional row colour tag.
    pub row_color: Option<String>,
    /// Timestamp when the record was created.
    pub created_at: Timestamp,
    /// Timestamp when the record was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRecord {
    /// The table this record belongs to.
    pub table_id: Uuid,
    /// Cell values keyed by field id.
    pub values: serde_json::Value,
}
