//! Base (tenant workspace) model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::bases;

/// A tenant workspace containing tables, views, forms, automations,
/// webhooks, and collaborators.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = bases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Base {
    /// Unique base identifier.
    pub id: Uuid,
    /// Human-readable base name.
    pub display_name: String,
    /// The account that owns the base. The owner is always present in the
    /// collaborator set with the owner role.
    pub owner_id: Uuid,
    /// Timestamp when the base was created.
    pub created_at: Timestamp,
    /// Timestamp when the base was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new base.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewBase {
    /// Base name.
    pub display_name: String,
    /// Owning account.
    pub owner_id: Uuid,
}

/// Data for updating a base.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = bases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateBase {
    /// New base name.
    pub display_name: Option<String>,
}
