//! View model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::views;
use crate::types::ViewType;

/// A persisted presentation (filters, sorts, grouping) of a table's records.
///
/// Publishing generates an opaque public token on first publish; the token
/// persists across unpublish/republish cycles unless explicitly revoked.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = views)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct View {
    /// Unique view identifier.
    pub id: Uuid,
    /// The table this view presents.
    pub table_id: Uuid,
    /// Human-readable view name.
    pub display_name: String,
    /// Presentation type.
    pub view_type: ViewType,
    /// Filters, sorts, grouping, and type-specific options.
    pub config: serde_json::Value,
    /// Whether the view is reachable via its public token.
    pub is_public: bool,
    /// Opaque public token, set on first publish.
    pub public_token: Option<String>,
    /// Timestamp when the view was created.
    pub created_at: Timestamp,
    /// Timestamp when the view was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new view.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = views)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewView {
    /// The table this view presents.
    pub table_id: Uuid,
    /// View name.
    pub display_name: String,
    /// Presentation type.
    pub view_type: ViewType,
    /// Presentation configuration.
    pub config: serde_json::Value,
}

/// Data for updating a view.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = views)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateView {
    /// New view name.
    pub display_name: Option<String>,
    /// New presentation type.
    pub view_type: Option<ViewType>,
    /// New presentation configuration.
    pub config: Option<serde_json::Value>,
}
