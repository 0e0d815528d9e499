//! Comment thread handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::query::{CommentRepository, RecordRepository};

use crate::extract::{AuthSession, Json, Path, PgPool, Query, ValidateJson};
use crate::handler::request::{
    CommentPathParams, CreateCommentRequest, PaginationQuery, RecordPathParams,
    ResolveCommentRequest, UpdateCommentRequest,
};
use crate::handler::response::{CommentInfo, ErrorResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::{MutationService, ServiceState};

/// Creates a comment on a record.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, record_id = %path_params.record_id))]
async fn create_comment(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<RecordPathParams>,
    ValidateJson(request): ValidateJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentInfo>)> {
    let comment = mutations
        .create_comment(
            &auth,
            path_params.record_id,
            &request.content,
            request.parent_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

fn create_comment_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create comment")
        .description("Parents must live on the same record.")
        .response::<201, Json<CommentInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Lists a record's comments.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, record_id = %path_params.record_id))]
async fn list_comments(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<RecordPathParams>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<(StatusCode, Json<Vec<CommentInfo>>)> {
    // The record lookup doubles as the membership check.
    conn.find_record_for_user(path_params.record_id, auth.user_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Record not found").into_static())?;

    let comments = conn
        .list_comments_for_record(path_params.record_id, pagination.into())
        .await?;
    let comments: Vec<CommentInfo> = comments.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(comments)))
}

fn list_comments_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List comments")
        .response::<200, Json<Vec<CommentInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Edits a comment. Authors only.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, comment_id = %path_params.comment_id))]
async fn update_comment(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<CommentPathParams>,
    ValidateJson(request): ValidateJson<UpdateCommentRequest>,
) -> Result<(StatusCode, Json<CommentInfo>)> {
    let comment = mutations
        .update_comment(&auth, path_params.comment_id, &request.content)
        .await?;

    Ok((StatusCode::OK, Json(comment.into())))
}

fn update_comment_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Edit comment")
        .response::<200, Json<CommentInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Resolves or reopens a comment thread.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, comment_id = %path_params.comment_id))]
async fn resolve_comment(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<CommentPathParams>,
    Json(request): Json<ResolveCommentRequest>,
) -> Result<(StatusCode, Json<CommentInfo>)> {
    let comment = mutations
        .resolve_comment(&auth, path_params.comment_id, request.resolved)
        .await?;

    Ok((StatusCode::OK, Json(comment.into())))
}

fn resolve_comment_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Resolve comment")
        .response::<200, Json<CommentInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a comment. Authors delete their own; the base owner any.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, comment_id = %path_params.comment_id))]
async fn delete_comment(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<CommentPathParams>,
) -> Result<StatusCode> {
    mutations.delete_comment(&auth, path_params.comment_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn delete_comment_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete comment")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for comment management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/records/{record_id}/comments",
            post_with(create_comment, create_comment_docs)
                .get_with(list_comments, list_comments_docs),
        )
        .api_route(
            "/comments/{comment_id}",
            patch_with(update_comment, update_comment_docs)
                .delete_with(delete_comment, delete_comment_docs),
        )
        .api_route(
            "/comments/{comment_id}/resolve",
            post_with(resolve_comment, resolve_comment_docs),
        )
        .with_path_items(|item| item.tag("Comments"))
}
