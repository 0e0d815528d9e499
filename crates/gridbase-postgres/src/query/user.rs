//! User repository for account lookup and management.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::lower;
use crate::model::{NewUser, UpdateUser, User};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for user account database operations.
pub trait UserRepository {
    /// Creates a new user account.
    fn create_user(&mut self, new_user: NewUser) -> impl Future<Output = PgResult<User>> + Send;

    /// Finds a user by ID.
    fn find_user_by_id(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<User>>> + Send;

    /// Finds a user by email address, compared case-insensitively.
    fn find_user_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = PgResult<Option<User>>> + Send;

    /// Updates a user account.
    fn update_user(
        &mut self,
        user_id: Uuid,
        changes: UpdateUser,
    ) -> impl Future<Output = PgResult<User>> + Send;
}

impl UserRepository for PgConnection {
    async fn create_user(&mut self, new_user: NewUser) -> PgResult<User> {
        use schema::users;

        let user = diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(user)
    }

    async fn find_user_by_id(&mut self, target_id: Uuid) -> PgResult<Option<User>> {
        use schema::users::dsl::*;

        let user = users
            .filter(id.eq(target_id))
            .select(User::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(user)
    }

    async fn find_user_by_email(&mut self, email: &str) -> PgResult<Option<User>> {
        use schema::users::dsl::*;

        let user = users
            .filter(lower(email_address).eq(email.to_lowercase()))
            .select(User::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(user)
    }

    async fn update_user(&mut self, target_id: Uuid, changes: UpdateUser) -> PgResult<User> {
        use schema::users::dsl::*;

        let user = diesel::update(users)
            .filter(id.eq(target_id))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(user)
    }
}
