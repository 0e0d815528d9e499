//! User account model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::users;

/// A registered user account.
///
/// Emails are stored as entered but compared case-insensitively; the unique
/// index is over `lower(email_address)`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Email address, unique case-insensitively.
    pub email_address: String,
    /// Display name shown to collaborators.
    pub display_name: String,
    /// Argon2 password hash; `None` for accounts without a password yet.
    pub password_hash: Option<String>,
    /// Timestamp when the account was created.
    pub created_at: Timestamp,
    /// Timestamp when the account was last updated.
    pub updated_at: Timestamp,
}

impl User {
    /// Returns whether the account can authenticate with a password.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    /// Email address; normalised lower-case before uniqueness compare.
    pub email_address: String,
    /// Display name.
    pub display_name: String,
    /// Argon2 password hash.
    pub password_hash: Option<String>,
}

/// Data for updating a user.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateUser {
    /// New display name.
    pub display_name: Option<String>,
    /// New password hash.
    pub password_hash: Option<String>,
}
