//! Field management handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::query::{FieldRepository, TableRepository};
use gridbase_postgres::types::CollaboratorRole;

use crate::extract::{AuthSession, Json, Path, PgPool, ValidateJson};
use crate::handler::request::{
    CreateFieldRequest, FieldPathParams, ReorderRequest, TablePathParams, UpdateFieldRequest,
};
use crate::handler::response::{ErrorResponse, FieldInfo};
use crate::handler::{ErrorKind, Result};
use crate::service::{MutationService, ObjectStore, ServiceState};

/// Tracing target for field handlers.
const TRACING_TARGET: &str = "gridbase_server::handler::fields";

/// Creates a field on a table.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn create_field(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    ValidateJson(request): ValidateJson<CreateFieldRequest>,
) -> Result<(StatusCode, Json<FieldInfo>)> {
    let field = mutations
        .create_field(
            &auth,
            path_params.table_id,
            &request.name,
            request.field_type,
            request.options,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(field.into())))
}

fn create_field_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create field")
        .description("Creates a typed field; options are validated against the type.")
        .response::<201, Json<FieldInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Lists a table's fields in display order.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn list_fields(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
) -> Result<(StatusCode, Json<Vec<FieldInfo>>)> {
    let table = conn
        .find_table_by_id(path_params.table_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Table not found").into_static())?;
    auth.require_role(&mut conn, table.base_id, CollaboratorRole::Viewer)
        .await?;

    let fields = conn.list_fields_for_table(path_params.table_id).await?;
    let fields: Vec<FieldInfo> = fields.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(fields)))
}

fn list_fields_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List fields")
        .response::<200, Json<Vec<FieldInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Updates a field's name, options, or type.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, field_id = %path_params.field_id))]
async fn update_field(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<FieldPathParams>,
    ValidateJson(request): ValidateJson<UpdateFieldRequest>,
) -> Result<(StatusCode, Json<FieldInfo>)> {
    let field = mutations
        .update_field(
            &auth,
            path_params.field_id,
            request.name.as_deref(),
            request.field_type,
            request.options,
        )
        .await?;

    Ok((StatusCode::OK, Json(field.into())))
}

fn update_field_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update field")
        .description("Type changes are admitted only when every stored value is compatible.")
        .response::<200, Json<FieldInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a field and its values.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, field_id = %path_params.field_id))]
async fn delete_field(
    State(mutations): State<MutationService>,
    State(storage): State<ObjectStore>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<FieldPathParams>,
) -> Result<StatusCode> {
    let orphaned = mutations.delete_field(&auth, path_params.field_id).await?;

    // Post-commit blob cleanup; failures are logged, the rows are gone.
    for storage_key in orphaned {
        if let Err(err) = storage.delete(&storage_key).await {
            tracing::warn!(
                target: TRACING_TARGET,
                storage_key = %storage_key,
                error = %err,
                "failed to delete orphaned attachment blob"
            );
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

fn delete_field_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete field")
        .description("Removes the field, its cell values, and its attachments.")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Atomically reorders a table's fields.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn reorder_fields(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    ValidateJson(request): ValidateJson<ReorderRequest>,
) -> Result<(StatusCode, Json<Vec<FieldInfo>>)> {
    let fields = mutations
        .reorder_fields(&auth, path_params.table_id, &request.ordered_ids)
        .await?;
    let fields: Vec<FieldInfo> = fields.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(fields)))
}

fn reorder_fields_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Reorder fields")
        .response::<200, Json<Vec<FieldInfo>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Returns routes for field management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/tables/{table_id}/fields",
            post_with(create_field, create_field_docs).get_with(list_fields, list_fields_docs),
        )
        .api_route(
            "/tables/{table_id}/fields/reorder",
            post_with(reorder_fields, reorder_fields_docs),
        )
        .api_route(
            "/fields/{field_id}",
            patch_with(update_field, update_field_docs)
                .delete_with(delete_field, delete_field_docs),
        )
        .with_path_items(|item| item.tag("Fields"))
}
