//! Activity journal model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::activities;
use crate::types::{ActivityAction, EntityKind};

/// An append-only journal entry recording one state change.
///
/// Written by the mutation path in the same transaction as the change it
/// describes; entries are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = activities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Activity {
    /// Unique entry identifier.
    pub id: Uuid,
    /// The base where the change occurred.
    pub base_id: Uuid,
    /// The affected table, when applicable.
    pub table_id: Option<Uuid>,
    /// The affected record, when applicable.
    pub record_id: Option<Uuid>,
    /// The acting account; `None` for system-initiated changes.
    pub user_id: Option<Uuid>,
    /// The performed action.
    pub action: ActivityAction,
    /// The kind of entity acted upon.
    pub entity: EntityKind,
    /// Snapshot of the change (new values, previous values where relevant).
    pub changes: serde_json::Value,
    /// Timestamp when the change occurred.
    pub created_at: Timestamp,
}

/// Data for appending a new journal entry.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = activities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewActivity {
    /// The base where the change occurred.
    pub base_id: Uuid,
    /// The affected table.
    pub table_id: Option<Uuid>,
    /// The affected record.
    pub record_id: Option<Uuid>,
    /// The acting account.
    pub user_id: Option<Uuid>,
    /// The performed action.
    pub action: ActivityAction,
    /// The kind of entity acted upon.
    pub entity: EntityKind,
    /// Snapshot of the change.
    pub changes: serde_json::Value,
}
