//! CSV import and export handlers.

use std::collections::HashMap;

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use gridbase_postgres::query::{FieldRepository, RecordRepository, TableRepository};
use gridbase_postgres::types::CollaboratorRole;
use uuid::Uuid;

use crate::extract::{AuthSession, Json, Path, PgPool};
use crate::handler::request::ImportRequest;
use crate::handler::request::TablePathParams;
use crate::handler::response::ErrorResponse;
use crate::handler::{Error, ErrorKind, Result};
use crate::service::csv::{self, ImportOutcome, ImportPreview};
use crate::service::{MutationService, ServiceState};

/// Tracing target for CSV handlers.
const TRACING_TARGET: &str = "gridbase_server::handler::import_export";

/// The CSV payload of an import, read from either body variant.
///
/// Accepts `multipart/form-data` (file field `file`, optional JSON-encoded
/// `mappings` field) or a JSON body `{data, mappings}`.
struct ImportPayload {
    data: String,
    mappings: HashMap<String, Uuid>,
}

impl<S> FromRequest<S> for ImportPayload
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                ErrorKind::InvalidRequest
                    .with_message("Malformed multipart body")
                    .with_context(e.to_string())
                    .into_static()
            })?;
            return read_multipart_import(multipart).await;
        }

        let Json(body) = <Json<ImportRequest> as FromRequest<S>>::from_request(req, state).await?;
        Ok(Self {
            data: body.data,
            mappings: body.mappings,
        })
    }
}

impl aide::OperationInput for ImportPayload {}

/// Reads `file` and optional `mappings` fields from a multipart body.
async fn read_multipart_import(mut multipart: Multipart) -> Result<ImportPayload, Error<'static>> {
    let mut data = None;
    let mut mappings = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ErrorKind::InvalidRequest
            .with_message("Malformed multipart body")
            .with_context(e.to_string())
            .into_static()
    })? {
        match field.name() {
            Some("file") => {
                let bytes = field.bytes().await.map_err(|e| {
                    ErrorKind::InvalidRequest
                        .with_message("Failed to read upload")
                        .with_context(e.to_string())
                        .into_static()
                })?;
                data = Some(String::from_utf8_lossy(&bytes).into_owned());
            }
            Some("mappings") => {
                let text = field.text().await.map_err(|e| {
                    ErrorKind::InvalidRequest
                        .with_message("Failed to read mappings")
                        .with_context(e.to_string())
                        .into_static()
                })?;
                mappings = serde_json::from_str(&text).map_err(|e| {
                    ErrorKind::InvalidRequest
                        .with_message("Mappings must map column names to field ids")
                        .with_context(e.to_string())
                        .into_static()
                })?;
            }
            _ => continue,
        }
    }

    let data = data.ok_or_else(|| ErrorKind::FileRequired.into_error())?;
    Ok(ImportPayload { data, mappings })
}

/// Exports a table's records as CSV.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn export_table(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
) -> Result<Response> {
    let table = conn
        .find_table_by_id(path_params.table_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Table not found").into_static())?;
    auth.require_role(&mut conn, table.base_id, CollaboratorRole::Viewer)
        .await?;

    let fields = conn.list_fields_for_table(path_params.table_id).await?;

    let mut records = Vec::new();
    let mut page = gridbase_postgres::query::Pagination::new(1000, 0);
    loop {
        let batch = conn.list_records_for_table(path_params.table_id, page).await?;
        if batch.is_empty() {
            break;
        }
        records.extend(batch);
        page.offset += page.limit;
    }

    let body = csv::export_records(&fields, &records);
    let disposition = format!(
        "attachment; filename=\"{}.csv\"",
        table.display_name.replace('"', "_")
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

fn export_table_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Export table as CSV")
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Parses an upload into a bounded preview for mapping UIs.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn preview_import(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    payload: ImportPayload,
) -> Result<(StatusCode, Json<ImportPreview>)> {
    let table = conn
        .find_table_by_id(path_params.table_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Table not found").into_static())?;
    auth.require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
        .await?;

    let preview = csv::preview(&payload.data).map_err(|e| {
        ErrorKind::InvalidRequest.with_message(e.to_string()).into_static()
    })?;

    Ok((StatusCode::OK, Json(preview)))
}

fn preview_import_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Preview CSV import")
        .response::<200, Json<ImportPreview>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Imports CSV rows into a table.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn import_table(
    PgPool(mut conn): PgPool,
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    payload: ImportPayload,
) -> Result<(StatusCode, Json<ImportOutcome>)> {
    let table = conn
        .find_table_by_id(path_params.table_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Table not found").into_static())?;
    auth.require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
        .await?;

    let fields = conn.list_fields_for_table(path_params.table_id).await?;
    let (rows, mut outcome) =
        csv::import_rows(&payload.data, &payload.mappings, &fields).map_err(|e| {
            ErrorKind::InvalidRequest.with_message(e.to_string()).into_static()
        })?;

    if !rows.is_empty() {
        // Rows already passed coercion; a rejected bulk insert downgrades
        // them to errors rather than failing the whole import.
        match mutations
            .bulk_create_records(&auth, path_params.table_id, rows)
            .await
        {
            Ok(records) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    imported = records.len(),
                    skipped = outcome.skipped,
                    errors = outcome.errors,
                    "import completed"
                );
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %err,
                    "import rows failed to persist"
                );
                outcome.errors += outcome.imported;
                outcome.imported = 0;
            }
        }
    }

    Ok((StatusCode::OK, Json(outcome)))
}

fn import_table_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Import CSV into table")
        .description("Accepts multipart (file field `file`) or a JSON `{data, mappings}` body; responds with `{imported, skipped, errors}`.")
        .response::<200, Json<ImportOutcome>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Returns routes for CSV import and export.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/tables/{table_id}/export",
            get_with(export_table, export_table_docs),
        )
        .api_route(
            "/tables/{table_id}/import/preview",
            post_with(preview_import, preview_import_docs),
        )
        .api_route(
            "/tables/{table_id}/import",
            post_with(import_table, import_table_docs),
        )
        .with_path_items(|item| item.tag("Import/Export"))
}
