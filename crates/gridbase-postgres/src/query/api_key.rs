//! API key repository for programmatic authentication.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{ApiKey, NewApiKey};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for API key database operations.
pub trait ApiKeyRepository {
    /// Creates a new API key record.
    fn create_api_key(
        &mut self,
        new_key: NewApiKey,
    ) -> impl Future<Output = PgResult<ApiKey>> + Send;

    /// Finds an API key by ID.
    fn find_api_key_by_id(
        &mut self,
        key_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<ApiKey>>> + Send;

    /// Finds an API key by the digest of its raw key.
    fn find_api_key_by_digest(
        &mut self,
        digest: &[u8],
    ) -> impl Future<Output = PgResult<Option<ApiKey>>> + Send;

    /// Lists all API keys of a user.
    fn list_api_keys_for_user(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<ApiKey>>> + Send;

    /// Records a use of the key.
    fn touch_api_key(&mut self, key_id: Uuid) -> impl Future<Output = PgResult<()>> + Send;

    /// Deletes an API key. Returns whether a row was removed.
    fn delete_api_key(&mut self, key_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;
}

impl ApiKeyRepository for PgConnection {
    async fn create_api_key(&mut self, new_key: NewApiKey) -> PgResult<ApiKey> {
        use schema::api_keys;

        let key = diesel::insert_into(api_keys::table)
            .values(&new_key)
            .returning(ApiKey::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(key)
    }

    async fn find_api_key_by_id(&mut self, key_id: Uuid) -> PgResult<Option<ApiKey>> {
        use schema::api_keys::dsl::*;

        let key = api_keys
            .filter(id.eq(key_id))
            .select(ApiKey::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(key)
    }

    async fn find_api_key_by_digest(&mut self, digest: &[u8]) -> PgResult<Option<ApiKey>> {
        use schema::api_keys::dsl::*;

        let key = api_keys
            .filter(key_digest.eq(digest))
            .select(ApiKey::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(key)
    }

    async fn list_api_keys_for_user(&mut self, target_user: Uuid) -> PgResult<Vec<ApiKey>> {
        use schema::api_keys::dsl::*;

        let keys = api_keys
            .filter(user_id.eq(target_user))
            .select(ApiKey::as_select())
            .order(created_at.desc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(keys)
    }

    async fn touch_api_key(&mut self, key_id: Uuid) -> PgResult<()> {
        use schema::api_keys::dsl::*;

        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        diesel::update(api_keys)
            .filter(id.eq(key_id))
            .set(last_used_at.eq(Some(now)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }

    async fn delete_api_key(&mut self, key_id: Uuid) -> PgResult<bool> {
        use schema::api_keys::dsl::*;

        let deleted = diesel::delete(api_keys)
            .filter(id.eq(key_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
