//! API key model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::api_keys;
use crate::types::ApiScope;

/// An API key for programmatic access.
///
/// The raw key is returned to the caller exactly once at creation; the
/// server persists only its SHA-256 digest plus a short prefix for display.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = api_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApiKey {
    /// Unique key identifier.
    pub id: Uuid,
    /// The account that owns this key.
    pub user_id: Uuid,
    /// Human-readable name for the key.
    pub display_name: String,
    /// SHA-256 digest of the raw key.
    pub key_digest: Vec<u8>,
    /// First characters of the raw key, for display.
    pub key_prefix: String,
    /// Capabilities granted to the key.
    pub scopes: Vec<Option<ApiScope>>,
    /// Timestamp of the most recent use.
    pub last_used_at: Option<Timestamp>,
    /// Timestamp when the key was created.
    pub created_at: Timestamp,
}

impl ApiKey {
    /// Returns whether the key carries the given scope.
    pub fn has_scope(&self, scope: ApiScope) -> bool {
        self.scopes.iter().flatten().any(|s| *s == scope)
    }
}

/// Data for creating a new API key.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = api_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewApiKey {
    /// The account that owns this key.
    pub user_id: Uuid,
    /// Human-readable name.
    pub display_name: String,
    /// SHA-256 digest of the raw key.
    pub key_digest: Vec<u8>,
    /// Display prefix of the raw key.
    pub key_prefix: String,
    /// Granted capabilities.
    pub scopes: Vec<Option<ApiScope>>,
}
