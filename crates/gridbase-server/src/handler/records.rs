//! Record handlers: the authoritative read and write surface for rows.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::query::{RecordRepository, TableRepository};
use gridbase_postgres::types::CollaboratorRole;

use crate::extract::{AuthSession, Json, Path, PgPool, Query};
use crate::handler::request::{
    BulkCreateRecordsRequest, PaginationQuery, RecordPathParams, RecordValuesRequest,
    SetRecordColorRequest, TablePathParams,
};
use crate::handler::response::{ErrorResponse, RecordInfo, RecordPage};
use crate::handler::{ErrorKind, Result};
use crate::service::{MutationService, ObjectStore, ServiceState};

/// Tracing target for record handlers.
const TRACING_TARGET: &str = "gridbase_server::handler::records";

/// Creates a record.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn create_record(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    Json(request): Json<RecordValuesRequest>,
) -> Result<(StatusCode, Json<RecordInfo>)> {
    let record = mutations
        .create_record(&auth, path_params.table_id, request.values)
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

fn create_record_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create record")
        .response::<201, Json<RecordInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Creates records in bulk, preserving input order.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn bulk_create_records(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    Json(request): Json<BulkCreateRecordsRequest>,
) -> Result<(StatusCode, Json<Vec<RecordInfo>>)> {
    let values_list = request.records.into_iter().map(|r| r.values).collect();
    let records = mutations
        .bulk_create_records(&auth, path_params.table_id, values_list)
        .await?;
    let records: Vec<RecordInfo> = records.into_iter().map(Into::into).collect();

    Ok((StatusCode::CREATED, Json(records)))
}

fn bulk_create_records_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Bulk create records")
        .response::<201, Json<Vec<RecordInfo>>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Lists a table's records with pagination.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn list_records(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<(StatusCode, Json<RecordPage>)> {
    let table = conn
        .find_table_by_id(path_params.table_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Table not found").into_static())?;
    auth.require_role(&mut conn, table.base_id, CollaboratorRole::Viewer)
        .await?;

    let records = conn
        .list_records_for_table(path_params.table_id, pagination.into())
        .await?;
    let total = conn.count_records_for_table(path_params.table_id).await?;

    Ok((
        StatusCode::OK,
        Json(RecordPage {
            records: records.into_iter().map(Into::into).collect(),
            total,
        }),
    ))
}

fn list_records_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List records")
        .response::<200, Json<RecordPage>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns one record.
///
/// The lookup itself verifies collaborator membership, so an id from a
/// foreign base behaves exactly like a missing record.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, record_id = %path_params.record_id))]
async fn read_record(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<RecordPathParams>,
) -> Result<(StatusCode, Json<RecordInfo>)> {
    let record = conn
        .find_record_for_user(path_params.record_id, auth.user_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Record not found").into_static())?;

    Ok((StatusCode::OK, Json(record.into())))
}

fn read_record_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get record")
        .response::<200, Json<RecordInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Replaces a record's values wholesale.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, record_id = %path_params.record_id))]
async fn replace_record(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<RecordPathParams>,
    Json(request): Json<RecordValuesRequest>,
) -> Result<(StatusCode, Json<RecordInfo>)> {
    let record = mutations
        .replace_record(&auth, path_params.record_id, request.values)
        .await?;

    Ok((StatusCode::OK, Json(record.into())))
}

fn replace_record_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Replace record")
        .response::<200, Json<RecordInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Merges values into a record field by field.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, record_id = %path_params.record_id))]
async fn patch_record(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<RecordPathParams>,
    Json(request): Json<RecordValuesRequest>,
) -> Result<(StatusCode, Json<RecordInfo>)> {
    let record = mutations
        .patch_record(&auth, path_params.record_id, request.values)
        .await?;

    Ok((StatusCode::OK, Json(record.into())))
}

fn patch_record_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Patch record")
        .description("Merges cell values; `null` clears the addressed cell.")
        .response::<200, Json<RecordInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a record.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, record_id = %path_params.record_id))]
async fn delete_record(
    State(mutations): State<MutationService>,
    State(storage): State<ObjectStore>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<RecordPathParams>,
) -> Result<StatusCode> {
    let orphaned = mutations.delete_record(&auth, path_params.record_id).await?;

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

fn delete_record_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete record")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Sets or clears a record's row colour.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, record_id = %path_params.record_id))]
async fn set_record_color(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<RecordPathParams>,
    Json(request): Json<SetRecordColorRequest>,
) -> Result<(StatusCode, Json<RecordInfo>)> {
    let record = mutations
        .set_record_color(&auth, path_params.record_id, request.color)
        .await?;

    Ok((StatusCode::OK, Json(record.into())))
}

fn set_record_color_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Set row colour")
        .response::<200, Json<RecordInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for record management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/tables/{table_id}/records",
            post_with(create_record, create_record_docs)
                .get_with(list_records, list_records_docs),
        )
        .api_route(
            "/tables/{table_id}/records/bulk",
            post_with(bulk_create_records, bulk_create_records_docs),
        )
        .api_route(
            "/records/{record_id}",
            get_with(read_record, read_record_docs)
                .put_with(replace_record, replace_record_docs)
                .patch_with(patch_record, patch_record_docs)
                .delete_with(delete_record, delete_record_docs),
        )
        .api_route(
            "/records/{record_id}/color",
            put_with(set_record_color, set_record_color_docs),
        )
        .with_path_items(|item| item.tag("Records"))
}
