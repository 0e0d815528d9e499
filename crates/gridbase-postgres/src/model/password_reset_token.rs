//! Password reset token model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::password_reset_tokens;

/// A single-use password reset token.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = password_reset_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PasswordResetToken {
    /// Unique token identifier.
    pub id: Uuid,
    /// The account this token resets.
    pub user_id: Uuid,
    /// SHA-256 digest of the opaque reset token.
    pub token_digest: Vec<u8>,
    /// Timestamp when the token was issued.
    pub issued_at: Timestamp,
    /// Timestamp after which the token rejects.
    pub expires_at: Timestamp,
    /// Timestamp when the token was consumed, if ever.
    pub used_at: Option<Timestamp>,
}

impl PasswordResetToken {
    /// Returns whether the token can still be redeemed at the given instant.
    pub fn is_redeemable_at(&self, now: jiff::Timestamp) -> bool {
        self.used_at.is_none() && self.expires_at.to_jiff() > now
    }
}

/// Data for creating a new password reset token.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = password_reset_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPasswordResetToken {
    /// The account this token resets.
    pub user_id: Uuid,
    /// SHA-256 digest of the opaque reset token.
    pub token_digest: Vec<u8>,
    /// Expiry timestamp.
    pub expires_at: Timestamp,
}
