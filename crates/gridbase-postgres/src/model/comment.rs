//! Comment model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::comments;

/// A threaded comment on a record.
///
/// The parent, if set, must refer to a comment on the same record.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    /// Unique comment identifier.
    pub id: Uuid,
    /// The record this comment is attached to.
    pub record_id: Uuid,
    /// The authoring account.
    pub author_id: Uuid,
    /// Comment body.
    pub content: String,
    /// Parent comment for threaded replies.
    pub parent_id: Option<Uuid>,
    /// Whether the thread is resolved.
    pub is_resolved: bool,
    /// Timestamp when the comment was created.
    pub created_at: Timestamp,
    /// Timestamp when the comment was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new comment.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewComment {
    /// The record this comment is attached to.
    pub record_id: Uuid,
    /// The authoring account.
    pub author_id: Uuid,
    /// Comment body.
    pub content: String,
    /// Parent comment for threaded replies.
    pub parent_id: Option<Uuid>,
}

/// Data for updating a comment.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateComment {
    /// New comment body.
    pub content: Option<String>,
    /// New resolved flag.
    pub is_resolved: Option<bool>,
}
