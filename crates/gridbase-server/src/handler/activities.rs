//! Activity journal read handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::http::StatusCode;
use gridbase_postgres::query::{ActivityRepository, RecordRepository};
use gridbase_postgres::types::CollaboratorRole;

use crate::extract::{AuthSession, Json, Path, PgPool, Query};
use crate::handler::request::{BasePathParams, PaginationQuery, RecordPathParams};
use crate::handler::response::{ActivityInfo, ErrorResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Lists a base's journal, newest first.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn list_base_activity(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<(StatusCode, Json<Vec<ActivityInfo>>)> {
    auth.require_role(&mut conn, path_params.base_id, CollaboratorRole::Viewer)
        .await?;

    let activities = conn
        .list_activities_for_base(path_params.base_id, pagination.into())
        .await?;
    let activities: Vec<ActivityInfo> = activities.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(activities)))
}

fn list_base_activity_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List base activity")
        .response::<200, Json<Vec<ActivityInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Lists a record's journal, newest first.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, record_id = %path_params.record_id))]
async fn list_record_activity(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<RecordPathParams>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<(StatusCode, Json<Vec<ActivityInfo>>)> {
    conn.find_record_for_user(path_params.record_id, auth.user_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Record not found").into_static())?;

    let activities = conn
        .list_activities_for_record(path_params.record_id, pagination.into())
        .await?;
    let activities: Vec<ActivityInfo> = activities.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(activities)))
}

fn list_record_activity_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List record activity")
        .response::<200, Json<Vec<ActivityInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for the activity journal.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/bases/{base_id}/activity",
            get_with(list_base_activity, list_base_activity_docs),
        )
        .api_route(
            "/records/{record_id}/activity",
            get_with(list_record_activity, list_record_activity_docs),
        )
        .with_path_items(|item| item.tag("Activity"))
}
