//! Base and collaborator management handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::query::{BaseCollaboratorRepository, BaseRepository};
use gridbase_postgres::types::CollaboratorRole;

use crate::extract::{AuthSession, Json, Path, PgPool, ValidateJson};
use crate::handler::request::{
    AddCollaboratorRequest, BaseNameRequest, BasePathParams, CollaboratorPathParams,
    DuplicateBaseRequest, UpdateCollaboratorRequest,
};
use crate::handler::response::{BaseInfo, CollaboratorInfo, ErrorResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::{MutationService, ServiceState};

/// Tracing target for base handlers.
const TRACING_TARGET: &str = "gridbase_server::handler::bases";

/// Creates a new base owned by the caller.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
async fn create_base(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    ValidateJson(request): ValidateJson<BaseNameRequest>,
) -> Result<(StatusCode, Json<BaseInfo>)> {
    let base = mutations.create_base(&auth, &request.name).await?;

    tracing::info!(target: TRACING_TARGET, base_id = %base.id, "base created");

    Ok((StatusCode::CREATED, Json(base.into())))
}

fn create_base_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create base")
        .response::<201, Json<BaseInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Lists the caller's bases.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id))]
async fn list_bases(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
) -> Result<(StatusCode, Json<Vec<BaseInfo>>)> {
    let bases = conn.list_bases_for_user(auth.user_id).await?;
    let bases: Vec<BaseInfo> = bases.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(bases)))
}

fn list_bases_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List bases")
        .response::<200, Json<Vec<BaseInfo>>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Returns one base the caller collaborates on.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn read_base(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
) -> Result<(StatusCode, Json<BaseInfo>)> {
    auth.require_role(&mut conn, path_params.base_id, CollaboratorRole::Viewer)
        .await?;

    let base = conn
        .find_base_by_id(path_params.base_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Base not found").into_static())?;

    Ok((StatusCode::OK, Json(base.into())))
}

fn read_base_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get base")
        .response::<200, Json<BaseInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Renames a base.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn rename_base(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
    ValidateJson(request): ValidateJson<BaseNameRequest>,
) -> Result<(StatusCode, Json<BaseInfo>)> {
    let base = mutations
        .rename_base(&auth, path_params.base_id, &request.name)
        .await?;

    Ok((StatusCode::OK, Json(base.into())))
}

fn rename_base_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Rename base")
        .response::<200, Json<BaseInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a base and its whole subtree.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn delete_base(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
) -> Result<StatusCode> {
    mutations.delete_base(&auth, path_params.base_id).await?;

    tracing::info!(target: TRACING_TARGET, base_id = %path_params.base_id, "base deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn delete_base_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete base")
        .description("Deletes the base; tables, records, views, forms, webhooks, and automations cascade.")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Duplicates a base into a new base owned by the caller.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn duplicate_base(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
    Json(request): Json<DuplicateBaseRequest>,
) -> Result<(StatusCode, Json<BaseInfo>)> {
    let base = mutations
        .duplicate_base(&auth, path_params.base_id, request.include_records)
        .await?;

    Ok((StatusCode::CREATED, Json(base.into())))
}

fn duplicate_base_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Duplicate base")
        .response::<201, Json<BaseInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Lists a base's collaborators.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn list_collaborators(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
) -> Result<(StatusCode, Json<Vec<CollaboratorInfo>>)> {
    auth.require_role(&mut conn, path_params.base_id, CollaboratorRole::Viewer)
        .await?;

    let collaborators = conn.list_base_collaborators(path_params.base_id).await?;
    let collaborators: Vec<CollaboratorInfo> =
        collaborators.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(collaborators)))
}

fn list_collaborators_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List collaborators")
        .response::<200, Json<Vec<CollaboratorInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Adds a collaborator by email. Owner only.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn add_collaborator(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
    ValidateJson(request): ValidateJson<AddCollaboratorRequest>,
) -> Result<(StatusCode, Json<CollaboratorInfo>)> {
    let collaborator = mutations
        .add_collaborator(&auth, path_params.base_id, &request.email, request.role)
        .await?;

    Ok((StatusCode::CREATED, Json(collaborator.into())))
}

fn add_collaborator_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Add collaborator")
        .response::<201, Json<CollaboratorInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Changes a collaborator's role. Owner only; the owner row is immutable.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn update_collaborator(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<CollaboratorPathParams>,
    Json(request): Json<UpdateCollaboratorRequest>,
) -> Result<(StatusCode, Json<CollaboratorInfo>)> {
    let collaborator = mutations
        .update_collaborator(
            &auth,
            path_params.base_id,
            path_params.user_id,
            request.role,
        )
        .await?;

    Ok((StatusCode::OK, Json(collaborator.into())))
}

fn update_collaborator_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update collaborator role")
        .response::<200, Json<CollaboratorInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Removes a collaborator. Owner only; the owner row cannot be removed.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn remove_collaborator(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<CollaboratorPathParams>,
) -> Result<StatusCode> {
    mutations
        .remove_collaborator(&auth, path_params.base_id, path_params.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn remove_collaborator_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Remove collaborator")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Returns routes for base and collaborator management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/bases",
            post_with(create_base, create_base_docs).get_with(list_bases, list_bases_docs),
        )
        .api_route(
            "/bases/{base_id}",
            get_with(read_base, read_base_docs)
                .patch_with(rename_base, rename_base_docs)
                .delete_with(delete_base, delete_base_docs),
        )
        .api_route(
            "/bases/{base_id}/duplicate",
            post_with(duplicate_base, duplicate_base_docs),
        )
        .api_route(
            "/bases/{base_id}/collaborators",
            get_with(list_collaborators, list_collaborators_docs)
                .post_with(add_collaborator, add_collaborator_docs),
        )
        .api_route(
            "/bases/{base_id}/collaborators/{user_id}",
            patch_with(update_collaborator, update_collaborator_docs)
                .delete_with(remove_collaborator, remove_collaborator_docs),
        )
        .with_path_items(|item| item.tag("Bases"))
}
