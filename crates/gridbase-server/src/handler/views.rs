//! View management handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::query::{TableRepository, ViewRepository};
use gridbase_postgres::types::CollaboratorRole;

use crate::extract::{AuthSession, Json, Path, PgPool, ValidateJson};
use crate::handler::request::{
    CreateViewRequest, SetViewPublicRequest, TablePathParams, UpdateViewRequest, ViewPathParams,
};
use crate::handler::response::{ErrorResponse, ViewInfo};
use crate::handler::{ErrorKind, Result};
use crate::service::{MutationService, ServiceState};

/// Creates a view on a table.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn create_view(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    ValidateJson(request): ValidateJson<CreateViewRequest>,
) -> Result<(StatusCode, Json<ViewInfo>)> {
    let view = mutations
        .create_view(
            &auth,
            path_params.table_id,
            &request.name,
            request.view_type,
            request.config,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view.into())))
}

fn create_view_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create view")
        .response::<201, Json<ViewInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Lists a table's views.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn list_views(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
) -> Result<(StatusCode, Json<Vec<ViewInfo>>)> {
    let table = conn
        .find_table_by_id(path_params.table_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Table not found").into_static())?;
    auth.require_role(&mut conn, table.base_id, CollaboratorRole::Viewer)
        .await?;

    let views = conn.list_views_for_table(path_params.table_id).await?;
    let views: Vec<ViewInfo> = views.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(views)))
}

fn list_views_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List views")
        .response::<200, Json<Vec<ViewInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Updates a view.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, view_id = %path_params.view_id))]
async fn update_view(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<ViewPathParams>,
    ValidateJson(request): ValidateJson<UpdateViewRequest>,
) -> Result<(StatusCode, Json<ViewInfo>)> {
    let view = mutations
        .update_view(
            &auth,
            path_params.view_id,
            request.name.as_deref(),
            request.view_type,
            request.config,
        )
        .await?;

    Ok((StatusCode::OK, Json(view.into())))
}

fn update_view_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update view")
        .response::<200, Json<ViewInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a view.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, view_id = %path_params.view_id))]
async fn delete_view(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<ViewPathParams>,
) -> Result<StatusCode> {
    mutations.delete_view(&auth, path_params.view_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn delete_view_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete view")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Publishes or unpublishes a view. Owner only.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, view_id = %path_params.view_id))]
async fn set_view_public(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<ViewPathParams>,
    Json(request): Json<SetViewPublicRequest>,
) -> Result<(StatusCode, Json<ViewInfo>)> {
    let view = mutations
        .set_view_public(&auth, path_params.view_id, request.is_public)
        .await?;

    Ok((StatusCode::OK, Json(view.into())))
}

fn set_view_public_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Publish or unpublish view")
        .description("The public token is generated on first publish and survives unpublish.")
        .response::<200, Json<ViewInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for view management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/tables/{table_id}/views",
            post_with(create_view, create_view_docs).get_with(list_views, list_views_docs),
        )
        .api_route(
            "/views/{view_id}",
            patch_with(update_view, update_view_docs).delete_with(delete_view, delete_view_docs),
        )
        .api_route(
            "/views/{view_id}/public",
            post_with(set_view_public, set_view_public_docs),
        )
        .with_path_items(|item| item.tag("Views"))
}
