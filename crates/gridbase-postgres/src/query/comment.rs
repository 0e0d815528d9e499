//! Comment repository for record discussion threads.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::Pagination;
use crate::model::{Comment, NewComment, UpdateComment};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for comment database operations.
pub trait CommentRepository {
    /// Creates a new comment.
    fn create_comment(
        &mut self,
        new_comment: NewComment,
    ) -> impl Future<Output = PgResult<Comment>> + Send;

    /// Finds a comment by ID.
    fn find_comment_by_id(
        &mut self,
        comment_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Comment>>> + Send;

    /// Lists a record's comments in creation order.
    fn list_comments_for_record(
        &mut self,
        record_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<Comment>>> + Send;

    /// Updates a comment's body or resolved flag.
    fn update_comment(
        &mut self,
        comment_id: Uuid,
        changes: UpdateComment,
    ) -> impl Future<Output = PgResult<Comment>> + Send;

    /// Hard-deletes a comment; replies cascade.
    fn delete_comment(&mut self, comment_id: Uuid)
    -> impl Future<Output = PgResult<bool>> + Send;
}

impl CommentRepository for PgConnection {
    async fn create_comment(&mut self, new_comment: NewComment) -> PgResult<Comment> {
        use schema::comments;

        let comment = diesel::insert_into(comments::table)
            .values(&new_comment)
            .returning(Comment::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(comment)
    }

    async fn find_comment_by_id(&mut self, target_id: Uuid) -> PgResult<Option<Comment>> {
        use schema::comments::dsl::*;

        let comment = comments
            .filter(id.eq(target_id))
            .select(Comment::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(comment)
    }

    async fn list_comments_for_record(
        &mut self,
        target_record: Uuid,
        pagination: Pagination,
    ) -> PgResult<Vec<Comment>> {
        use schema::comments::dsl::*;

        let rows = comments
            .filter(record_id.eq(target_record))
            .select(Comment::as_select())
            .order(created_at.asc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn update_comment(
        &mut self,
        target_id: Uuid,
        changes: UpdateComment,
    ) -> PgResult<Comment> {
        use schema::comments::dsl::*;

        let comment = diesel::update(comments)
            .filter(id.eq(target_id))
            .set(&changes)
            .returning(Comment::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(comment)
    }

    async fn delete_comment(&mut self, target_id: Uuid) -> PgResult<bool> {
        use schema::comments::dsl::*;

        let deleted = diesel::delete(comments)
            .filter(id.eq(target_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
