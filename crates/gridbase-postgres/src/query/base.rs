//! Base repository for tenant workspace operations.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{Base, NewBase, UpdateBase};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for base database operations.
pub trait BaseRepository {
    /// Creates a new base.
    fn create_base(&mut self, new_base: NewBase) -> impl Future<Output = PgResult<Base>> + Send;

    /// Finds a base by ID.
    fn find_base_by_id(
        &mut self,
        base_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Base>>> + Send;

    /// Lists all bases a user collaborates on, most recently updated first.
    fn list_bases_for_user(
        &mut self,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Base>>> + Send;

    /// Updates a base.
    fn update_base(
        &mut self,
        base_id: Uuid,
        changes: UpdateBase,
    ) -> impl Future<Output = PgResult<Base>> + Send;

    /// Hard-deletes a base; child rows cascade in the database.
    fn delete_base(&mut self, base_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;
}

impl BaseRepository for PgConnection {
    async fn create_base(&mut self, new_base: NewBase) -> PgResult<Base> {
        use schema::bases;

        let base = diesel::insert_into(bases::table)
            .values(&new_base)
            .returning(Base::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(base)
    }

    async fn find_base_by_id(&mut self, base_id: Uuid) -> PgResult<Option<Base>> {
        use schema::bases::dsl::*;

        let base = bases
            .filter(id.eq(base_id))
            .select(Base::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(base)
    }

    async fn list_bases_for_user(&mut self, target_user: Uuid) -> PgResult<Vec<Base>> {
        use schema::{base_collaborators, bases};

        let rows = bases::table
            .inner_join(base_collaborators::table)
            .filter(base_collaborators::user_id.eq(target_user))
            .select(Base::as_select())
            .order(bases::updated_at.desc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn update_base(&mut self, base_id: Uuid, changes: UpdateBase) -> PgResult<Base> {
        use schema::bases::dsl::*;

        let base = diesel::update(bases)
            .filter(id.eq(base_id))
            .set(&changes)
            .returning(Base::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(base)
    }

    async fn delete_base(&mut self, base_id: Uuid) -> PgResult<bool> {
        use schema::bases::dsl::*;

        let deleted = diesel::delete(bases)
            .filter(id.eq(base_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
