//! Base collaborator repository for membership and role management.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{BaseCollaborator, NewBaseCollaborator};
use crate::types::CollaboratorRole;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for collaborator membership operations.
///
/// Role resolution for the authorization layer goes through
/// [`BaseCollaboratorRepository::find_collaborator_role`]; the single-owner
/// invariant is enforced by a partial unique index.
pub trait BaseCollaboratorRepository {
    /// Adds a collaborator to a base.
    fn add_base_collaborator(
        &mut self,
        new_collaborator: NewBaseCollaborator,
    ) -> impl Future<Output = PgResult<BaseCollaborator>> + Send;

    /// Finds a collaborator row.
    fn find_base_collaborator(
        &mut self,
        base_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<BaseCollaborator>>> + Send;

    /// Resolves a user's role on a base, when they are a member.
    fn find_collaborator_role(
        &mut self,
        base_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<CollaboratorRole>>> + Send;

    /// Lists all collaborators of a base.
    fn list_base_collaborators(
        &mut self,
        base_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<BaseCollaborator>>> + Send;

    /// Changes a collaborator's role.
    fn update_collaborator_role(
        &mut self,
        base_id: Uuid,
        user_id: Uuid,
        new_role: CollaboratorRole,
    ) -> impl Future<Output = PgResult<BaseCollaborator>> + Send;

    /// Removes a collaborator. Returns whether a row was removed.
    fn remove_base_collaborator(
        &mut self,
        base_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;
}

impl BaseCollaboratorRepository for PgConnection {
    async fn add_base_collaborator(
        &mut self,
        new_collaborator: NewBaseCollaborator,
    ) -> PgResult<BaseCollaborator> {
        use schema::base_collaborators;

        let collaborator = diesel::insert_into(base_collaborators::table)
            .values(&new_collaborator)
            .returning(BaseCollaborator::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(collaborator)
    }

    async fn find_base_collaborator(
        &mut self,
        target_base: Uuid,
        target_user: Uuid,
    ) -> PgResult<Option<BaseCollaborator>> {
        use schema::base_collaborators::dsl::*;

        let collaborator = base_collaborators
            .filter(base_id.eq(target_base))
            .filter(user_id.eq(target_user))
            .select(BaseCollaborator::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(collaborator)
    }

    async fn find_collaborator_role(
        &mut self,
        target_base: Uuid,
        target_user: Uuid,
    ) -> PgResult<Option<CollaboratorRole>> {
        use schema::base_collaborators::dsl::*;

        let found = base_collaborators
            .filter(base_id.eq(target_base))
            .filter(user_id.eq(target_user))
            .select(role)
            .first::<CollaboratorRole>(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(found)
    }

    async fn list_base_collaborators(
        &mut self,
        target_base: Uuid,
    ) -> PgResult<Vec<BaseCollaborator>> {
        use schema::base_collaborators::dsl::*;

        let rows = base_collaborators
            .filter(base_id.eq(target_base))
            .select(BaseCollaborator::as_select())
            .order(created_at.asc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn update_collaborator_role(
        &mut self,
        target_base: Uuid,
        target_user: Uuid,
        new_role: CollaboratorRole,
    ) -> PgResult<BaseCollaborator> {
        use schema::base_collaborators::dsl::*;

        let collaborator = diesel::update(base_collaborators)
            .filter(base_id.eq(target_base))
            .filter(user_id.eq(target_user))
            .set(role.eq(new_role))
            .returning(BaseCollaborator::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(collaborator)
    }

    async fn remove_base_collaborator(
        &mut self,
        target_base: Uuid,
        target_user: Uuid,
    ) -> PgResult<bool> {
        use schema::base_collaborators::dsl::*;

        let deleted = diesel::delete(base_collaborators)
            .filter(base_id.eq(target_base))
            .filter(user_id.eq(target_user))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
