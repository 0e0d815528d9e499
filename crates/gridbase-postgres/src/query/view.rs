//! View repository for saved table presentations.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewView, UpdateView, View};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for view database operations.
pub trait ViewRepository {
    /// Creates a new view.
    fn create_view(&mut self, new_view: NewView) -> impl Future<Output = PgResult<View>> + Send;

    /// Finds a view by ID.
    fn find_view_by_id(
        &mut self,
        view_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<View>>> + Send;

    /// Finds a published view by its public token.
    fn find_view_by_public_token(
        &mut self,
        token: &str,
    ) -> impl Future<Output = PgResult<Option<View>>> + Send;

    /// Lists a table's views, oldest first.
    fn list_views_for_table(
        &mut self,
        table_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<View>>> + Send;

    /// Updates a view's name, type, or configuration.
    fn update_view(
        &mut self,
        view_id: Uuid,
        changes: UpdateView,
    ) -> impl Future<Output = PgResult<View>> + Send;

    /// Publishes a view. When `token` is `Some`, it becomes the view's
    /// public token (first publish); an existing token is kept otherwise.
    fn publish_view(
        &mut self,
        view_id: Uuid,
        token: Option<String>,
    ) -> impl Future<Output = PgResult<View>> + Send;

    /// Unpublishes a view, keeping its token for future re-publishes.
    fn unpublish_view(&mut self, view_id: Uuid) -> impl Future<Output = PgResult<View>> + Send;

    /// Hard-deletes a view.
    fn delete_view(&mut self, view_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;
}

impl ViewRepository for PgConnection {
    async fn create_view(&mut self, new_view: NewView) -> PgResult<View> {
        use schema::views;

        let view = diesel::insert_into(views::table)
            .values(&new_view)
            .returning(View::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(view)
    }

    async fn find_view_by_id(&mut self, target_id: Uuid) -> PgResult<Option<View>> {
        use schema::views::dsl::*;

        let view = views
            .filter(id.eq(target_id))
            .select(View::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(view)
    }

    async fn find_view_by_public_token(&mut self, token: &str) -> PgResult<Option<View>> {
        use schema::views::dsl::*;

        let view = views
            .filter(public_token.eq(token))
            .filter(is_public.eq(true))
            .select(View::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(view)
    }

    async fn list_views_for_table(&mut self, target_table: Uuid) -> PgResult<Vec<View>> {
        use schema::views::dsl::*;

        let rows = views
            .filter(table_id.eq(target_table))
            .select(View::as_select())
            .order(created_at.asc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn update_view(&mut self, target_id: Uuid, changes: UpdateView) -> PgResult<View> {
        use schema::views::dsl::*;

        let view = diesel::update(views)
            .filter(id.eq(target_id))
            .set(&changes)
            .returning(View::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(view)
    }

    async fn publish_view(&mut self, target_id: Uuid, token: Option<String>) -> PgResult<View> {
        use schema::views::dsl::*;

        let view = match token {
            Some(token) => {
                diesel::update(views)
                    .filter(id.eq(target_id))
                    .set((is_public.eq(true), public_token.eq(Some(token))))
                    .returning(View::as_returning())
                    .get_result(self)
                    .await
            }
            None => {
                diesel::update(views)
                    .filter(id.eq(target_id))
                    .set(is_public.eq(true))
                    .returning(View::as_returning())
                    .get_result(self)
                    .await
            }
        }
        .map_err(PgError::from)?;

        Ok(view)
    }

    async fn unpublish_view(&mut self, target_id: Uuid) -> PgResult<View> {
        use schema::views::dsl::*;

        let view = diesel::update(views)
            .filter(id.eq(target_id))
            .set(is_public.eq(false))
            .returning(View::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(view)
    }

    async fn delete_view(&mut self, target_id: Uuid) -> PgResult<bool> {
        use schema::views::dsl::*;

        let deleted = diesel::delete(views)
            .filter(id.eq(target_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
