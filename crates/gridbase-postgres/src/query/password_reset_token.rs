//! Password reset token repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{NewPasswordResetToken, PasswordResetToken};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for password reset token operations.
pub trait PasswordResetTokenRepository {
    /// Creates a new reset token.
    fn create_reset_token(
        &mut self,
        new_token: NewPasswordResetToken,
    ) -> impl Future<Output = PgResult<PasswordResetToken>> + Send;

    /// Finds a reset token by its digest regardless of validity.
    ///
    /// Validity (expiry, single-use) is checked by the caller so expired and
    /// used tokens can surface distinct error codes.
    fn find_reset_token_by_digest(
        &mut self,
        digest: &[u8],
    ) -> impl Future<Output = PgResult<Option<PasswordResetToken>>> + Send;

    /// Marks a reset token as consumed.
    fn mark_reset_token_used(
        &mut self,
        token_id: Uuid,
    ) -> impl Future<Output = PgResult<()>> + Send;

    /// Removes tokens that expired before now; returns the number deleted.
    fn delete_expired_reset_tokens(&mut self) -> impl Future<Output = PgResult<usize>> + Send;
}

impl PasswordResetTokenRepository for PgConnection {
    async fn create_reset_token(
        &mut self,
        new_token: NewPasswordResetToken,
    ) -> PgResult<PasswordResetToken> {
        use schema::password_reset_tokens;

        let token = diesel::insert_into(password_reset_tokens::table)
            .values(&new_token)
            .returning(PasswordResetToken::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(token)
    }

    async fn find_reset_token_by_digest(
        &mut self,
        digest: &[u8],
    ) -> PgResult<Option<PasswordResetToken>> {
        use schema::password_reset_tokens::dsl::*;

        let token = password_reset_tokens
            .filter(token_digest.eq(digest))
            .select(PasswordResetToken::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(token)
    }

    async fn mark_reset_token_used(&mut self, target_id: Uuid) -> PgResult<()> {
        use schema::password_reset_tokens::dsl::*;

        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        diesel::update(password_reset_tokens)
            .filter(id.eq(target_id))
            .set(used_at.eq(Some(now)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }

    async fn delete_expired_reset_tokens(&mut self) -> PgResult<usize> {
        use schema::password_reset_tokens::dsl::*;

        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        let deleted = diesel::delete(password_reset_tokens)
            .filter(expires_at.le(now))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted)
    }
}
