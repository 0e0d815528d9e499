//! Session repository for opaque-token authentication.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{NewSession, Session};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for session database operations.
///
/// Sessions are looked up by the SHA-256 digest of the opaque bearer token;
/// the raw token never reaches the database.
pub trait SessionRepository {
    /// Creates a new session.
    fn create_session(
        &mut self,
        new_session: NewSession,
    ) -> impl Future<Output = PgResult<Session>> + Send;

    /// Finds a live (unexpired) session by its token digest.
    fn find_live_session_by_digest(
        &mut self,
        digest: &[u8],
    ) -> impl Future<Output = PgResult<Option<Session>>> + Send;

    /// Lists all live sessions of a user.
    fn list_sessions_for_user(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Session>>> + Send;

    /// Records a use of the session.
    fn touch_session(&mut self, session_id: Uuid) -> impl Future<Output = PgResult<()>> + Send;

    /// Deletes a session by ID. Returns whether a row was removed.
    fn delete_session(&mut self, session_id: Uuid)
    -> impl Future<Output = PgResult<bool>> + Send;

    /// Deletes all sessions of a user, e.g. after a password reset.
    fn delete_sessions_for_user(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;

    /// Removes expired sessions; returns the number deleted.
    fn delete_expired_sessions(&mut self) -> impl Future<Output = PgResult<usize>> + Send;
}

impl SessionRepository for PgConnection {
    async fn create_session(&mut self, new_session: NewSession) -> PgResult<Session> {
        use schema::sessions;

        let session = diesel::insert_into(sessions::table)
            .values(&new_session)
            .returning(Session::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(session)
    }

    async fn find_live_session_by_digest(&mut self, digest: &[u8]) -> PgResult<Option<Session>> {
        use schema::sessions::dsl::*;

        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        let session = sessions
            .filter(token_digest.eq(digest))
            .filter(expires_at.gt(now))
            .select(Session::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(session)
    }

    async fn list_sessions_for_user(&mut self, target_user: Uuid) -> PgResult<Vec<Session>> {
        use schema::sessions::dsl::*;

        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        let rows = sessions
            .filter(user_id.eq(target_user))
            .filter(expires_at.gt(now))
            .select(Session::as_select())
            .order(issued_at.desc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn touch_session(&mut self, session_id: Uuid) -> PgResult<()> {
        use schema::sessions::dsl::*;

        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        diesel::update(sessions)
            .filter(id.eq(session_id))
            .set(last_seen_at.eq(Some(now)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }

    async fn delete_session(&mut self, session_id: Uuid) -> PgResult<bool> {
        use schema::sessions::dsl::*;

        let deleted = diesel::delete(sessions)
            .filter(id.eq(session_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }

    async fn delete_sessions_for_user(&mut self, target_user: Uuid) -> PgResult<usize> {
        use schema::sessions::dsl::*;

        let deleted = diesel::delete(sessions)
            .filter(user_id.eq(target_user))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted)
    }

    async fn delete_expired_sessions(&mut self) -> PgResult<usize> {
        use schema::sessions::dsl::*;

        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        let deleted = diesel::delete(sessions)
            .filter(expires_at.le(now))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted)
    }
}
