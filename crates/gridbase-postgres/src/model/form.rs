//! Form model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::forms;

/// A public submission form over a table.
///
/// The public token is globally unique and assigned at creation;
/// submissions validate against the table's field types and the form's
/// required flags.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = forms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Form {
    /// Unique form identifier.
    pub id: Uuid,
    /// The table submissions create records in.
    pub table_id: Uuid,
    /// Human-readable form name.
    pub display_name: String,
    /// Whether the form accepts submissions.
    pub is_active: bool,
    /// Opaque public token.
    pub public_token: String,
    /// Per-field presentation (label override, required, visible, position).
    pub form_fields: serde_json::Value,
    /// Timestamp when the form was created.
    pub created_at: Timestamp,
    /// Timestamp when the form was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new form.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = forms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewForm {
    /// The table submissions create records in.
    pub table_id: Uuid,
    /// Form name.
    pub display_name: String,
    /// Opaque public token.
    pub public_token: String,
    /// Per-field presentation settings.
    pub form_fields: serde_json::Value,
}

/// Data for updating a form.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = forms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateForm {
    /// New form name.
    pub display_name: Option<String>,
    /// Whether the form accepts submissions.
    pub is_active: Option<bool>,
    /// New per-field presentation settings.
    pub form_fields: Option<serde_json::Value>,
}
