//! Comment lifecycle operations.

use diesel_async::scoped_futures::ScopedFutureExt;
use gridbase_postgres::model::{Comment, NewActivity, NewComment, UpdateComment};
use gridbase_postgres::query::{ActivityRepository, CommentRepository, RecordRepository, TableRepository};
use gridbase_postgres::types::{ActivityAction, CollaboratorRole, EntityKind};
use uuid::Uuid;

use super::{MutationError, MutationResult, MutationService};
use crate::extract::Identity;

impl MutationService {
    /// Creates a comment on a record, optionally as a threaded reply.
    ///
    /// A parent comment must live on the same record; anything else is
    /// invalid input.
    pub async fn create_comment(
        &self,
        actor: &Identity,
        record_id: Uuid,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> MutationResult<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MutationError::invalid("comment content must not be empty"));
        }

        let mut conn = self.conn().await?;
        let record = conn
            .find_record_by_id(record_id)
            .await?
            .ok_or(MutationError::NotFound("record"))?;
        let table = conn
            .find_table_by_id(record.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        if let Some(parent_id) = parent_id {
            let parent = conn
                .find_comment_by_id(parent_id)
                .await?
                .ok_or(MutationError::NotFound("comment"))?;
            if parent.record_id != record_id {
                return Err(MutationError::invalid(
                    "parent comment belongs to a different record",
                ));
            }
        }

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = record.table_id;
        let author_id = actor.user_id;
        let body = content.to_string();
        let comment = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let comment = conn
                        .create_comment(NewComment {
                            record_id,
                            author_id,
                            content: body,
                            parent_id,
                        })
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: Some(record_id),
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Comment,
                        changes: serde_json::json!({ "comment_id": comment.id }),
                    })
                    .await?;

                    Ok(comment)
                }
                .scope_boxed()
            })
            .await?;

        Ok(comment)
    }

    /// Edits a comment's body. Authors may edit only their own comments.
    pub async fn update_comment(
        &self,
        actor: &Identity,
        comment_id: Uuid,
        content: &str,
    ) -> MutationResult<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MutationError::invalid("comment content must not be empty"));
        }

        let (mut conn, comment, base_id, table_id) =
            self.load_comment(actor, comment_id).await?;

        if comment.author_id != actor.user_id && !actor.is_system() {
            return Err(MutationError::Forbidden);
        }

        let journal_user = actor.journal_user();
        let body = content.to_string();
        let comment = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let comment = conn
                        .update_comment(
                            comment_id,
                            UpdateComment {
                                content: Some(body),
                                is_resolved: None,
                            },
                        )
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: Some(comment.record_id),
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Comment,
                        changes: serde_json::json!({ "comment_id": comment.id }),
                    })
                    .await?;

                    Ok(comment)
                }
                .scope_boxed()
            })
            .await?;

        Ok(comment)
    }

    /// Toggles a comment thread's resolved flag.
    pub async fn resolve_comment(
        &self,
        actor: &Identity,
        comment_id: Uuid,
        resolved: bool,
    ) -> MutationResult<Comment> {
        let (mut conn, _comment, base_id, table_id) =
            self.load_comment(actor, comment_id).await?;

        let journal_user = actor.journal_user();
        let comment = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let comment = conn
                        .update_comment(
                            comment_id,
                            UpdateComment {
                                content: None,
                                is_resolved: Some(resolved),
                            },
                        )
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: Some(comment.record_id),
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Comment,
                        changes: serde_json::json!({
                            "comment_id": comment.id,
                            "is_resolved": comment.is_resolved,
                        }),
                    })
                    .await?;

                    Ok(comment)
                }
                .scope_boxed()
            })
            .await?;

        Ok(comment)
    }

    /// Deletes a comment. Authors delete their own; the base owner may
    /// delete any.
    pub async fn delete_comment(
        &self,
        actor: &Identity,
        comment_id: Uuid,
    ) -> MutationResult<()> {
        let (mut conn, comment, base_id, table_id) =
            self.load_comment(actor, comment_id).await?;

        if comment.author_id != actor.user_id {
            // Not the author: only the owner role may remove it.
            actor
                .require_role(&mut conn, base_id, CollaboratorRole::Owner)
                .await?;
        }

        let journal_user = actor.journal_user();
        conn.transaction::<_, MutationError, _>(|conn| {
            async move {
                conn.delete_comment(comment_id).await?;

                conn.append_activity(NewActivity {
                    base_id,
                    table_id: Some(table_id),
                    record_id: Some(comment.record_id),
                    user_id: journal_user,
                    action: ActivityAction::Delete,
                    entity: EntityKind::Comment,
                    changes: serde_json::json!({ "comment_id": comment_id }),
                })
                .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        Ok(())
    }

    /// Loads a comment plus its base/table context and checks membership.
    async fn load_comment(
        &self,
        actor: &Identity,
        comment_id: Uuid,
    ) -> MutationResult<(gridbase_postgres::PgConn, Comment, Uuid, Uuid)> {
        let mut conn = self.conn().await?;
        let comment = conn
            .find_comment_by_id(comment_id)
            .await?
            .ok_or(MutationError::NotFound("comment"))?;
        let record = conn
            .find_record_by_id(comment.record_id)
            .await?
            .ok_or(MutationError::NotFound("record"))?;
        let table = conn
            .find_table_by_id(record.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        Ok((conn, comment, table.base_id, record.table_id))
    }
}
