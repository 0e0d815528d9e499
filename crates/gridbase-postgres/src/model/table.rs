//! Table model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::tables;

/// A table of records inside a base.
///
/// Positions within a base form a permutation maintained by the reorder
/// operation.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = tables)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Table {
    /// Unique table identifier.
    pub id: Uuid,
    /// The base this table belongs to.
    pub base_id: Uuid,
    /// Human-readable table name.
    pub display_name: String,
    /// Display position within the base.
    pub position: i32,
    /// Timestamp when the table was created.
    pub created_at: Timestamp,
    /// Timestamp when the table was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tables)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewTable {
    /// The base this table belongs to.
    pub base_id: Uuid,
    /// Table name.
    pub display_name: String,
    /// Display position within the base.
    pub position: i32,
}

/// Data for updating a table.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = tables)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateTable {
    /// New table name.
    pub display_name: Option<String>,
}
