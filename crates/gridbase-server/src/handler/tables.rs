//! Table management handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::query::TableRepository;
use gridbase_postgres::types::CollaboratorRole;

use crate::extract::{AuthSession, Json, Path, PgPool, ValidateJson};
use crate::handler::request::{
    BasePathParams, ReorderRequest, TableNameRequest, TablePathParams,
};
use crate::handler::response::{ErrorResponse, TableInfo};
use crate::handler::{ErrorKind, Result};
use crate::service::{MutationService, ServiceState};

/// Creates a table in a base.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn create_table(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
    ValidateJson(request): ValidateJson<TableNameRequest>,
) -> Result<(StatusCode, Json<TableInfo>)> {
    let table = mutations
        .create_table(&auth, path_params.base_id, &request.name)
        .await?;

    Ok((StatusCode::CREATED, Json(table.into())))
}

fn create_table_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create table")
        .description("Creates a table with its default grid view.")
        .response::<201, Json<TableInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Lists a base's tables in display order.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn list_tables(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
) -> Result<(StatusCode, Json<Vec<TableInfo>>)> {
    auth.require_role(&mut conn, path_params.base_id, CollaboratorRole::Viewer)
        .await?;

    let tables = conn.list_tables_for_base(path_params.base_id).await?;
    let tables: Vec<TableInfo> = tables.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(tables)))
}

fn list_tables_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List tables")
        .response::<200, Json<Vec<TableInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Returns one table.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn read_table(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
) -> Result<(StatusCode, Json<TableInfo>)> {
    let table = conn
        .find_table_by_id(path_params.table_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Table not found").into_static())?;

    auth.require_role(&mut conn, table.base_id, CollaboratorRole::Viewer)
        .await?;

    Ok((StatusCode::OK, Json(table.into())))
}

fn read_table_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get table")
        .response::<200, Json<TableInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Renames a table.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn rename_table(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    ValidateJson(request): ValidateJson<TableNameRequest>,
) -> Result<(StatusCode, Json<TableInfo>)> {
    let table = mutations
        .rename_table(&auth, path_params.table_id, &request.name)
        .await?;

    Ok((StatusCode::OK, Json(table.into())))
}

fn rename_table_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Rename table")
        .response::<200, Json<TableInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a table.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn delete_table(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
) -> Result<StatusCode> {
    mutations.delete_table(&auth, path_params.table_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn delete_table_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete table")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Duplicates a table within its base.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn duplicate_table(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
) -> Result<(StatusCode, Json<TableInfo>)> {
    let table = mutations.duplicate_table(&auth, path_params.table_id).await?;

    Ok((StatusCode::CREATED, Json(table.into())))
}

fn duplicate_table_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Duplicate table")
        .response::<201, Json<TableInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Atomically reorders a base's tables.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn reorder_tables(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
    ValidateJson(request): ValidateJson<ReorderRequest>,
) -> Result<(StatusCode, Json<Vec<TableInfo>>)> {
    let tables = mutations
        .reorder_tables(&auth, path_params.base_id, &request.ordered_ids)
        .await?;
    let tables: Vec<TableInfo> = tables.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(tables)))
}

fn reorder_tables_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Reorder tables")
        .description("Atomically rewrites positions; the ids must cover exactly the base's tables.")
        .response::<200, Json<Vec<TableInfo>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Returns routes for table management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/bases/{base_id}/tables",
            post_with(create_table, create_table_docs).get_with(list_tables, list_tables_docs),
        )
        .api_route(
            "/bases/{base_id}/tables/reorder",
            post_with(reorder_tables, reorder_tables_docs),
        )
        .api_route(
            "/tables/{table_id}",
            get_with(read_table, read_table_docs)
                .patch_with(rename_table, rename_table_docs)
                .delete_with(delete_table, delete_table_docs),
        )
        .api_route(
            "/tables/{table_id}/duplicate",
            post_with(duplicate_table, duplicate_table_docs),
        )
        .with_path_items(|item| item.tag("Tables"))
}
