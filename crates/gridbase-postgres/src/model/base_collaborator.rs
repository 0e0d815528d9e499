//! Base collaborator model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::base_collaborators;
use crate::types::CollaboratorRole;

/// Membership of a user in a base, with their role.
///
/// A partial unique index guarantees exactly one owner row per base.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = base_collaborators)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BaseCollaborator {
    /// The base this membership belongs to.
    pub base_id: Uuid,
    /// The member account.
    pub user_id: Uuid,
    /// The member's role.
    pub role: CollaboratorRole,
    /// Timestamp when the membership was created.
    pub created_at: Timestamp,
    /// Timestamp when the membership was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new collaborator membership.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = base_collaborators)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewBaseCollaborator {
    /// The base to join.
    pub base_id: Uuid,
    /// The joining account.
    pub user_id: Uuid,
    /// The granted role.
    pub role: CollaboratorRole,
}
