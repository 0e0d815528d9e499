//! Attachment handlers: multipart upload, download, and deletion.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use gridbase_postgres::query::{AttachmentRepository, RecordRepository};

use crate::extract::{AuthSession, Json, Path, PgPool};
use crate::handler::request::{AttachmentPathParams, RecordFieldPathParams};
use crate::handler::response::{AttachmentInfo, ErrorResponse};
use crate::handler::{Error, ErrorKind, Result};
use crate::service::{MutationService, ObjectStore, ServiceState};

/// Tracing target for attachment handlers.
const TRACING_TARGET: &str = "gridbase_server::handler::attachments";

/// Uploads a file into an attachment cell.
///
/// The blob streams into object storage first; only once the bytes are
/// safe does the metadata mutation run. A failed mutation removes the
/// fresh blob again.
#[tracing::instrument(skip_all, fields(
    user_id = %auth.user_id,
    record_id = %path_params.record_id,
    field_id = %path_params.field_id,
))]
async fn upload_attachment(
    State(mutations): State<MutationService>,
    State(storage): State<ObjectStore>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<RecordFieldPathParams>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AttachmentInfo>)> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ErrorKind::InvalidRequest
            .with_message("Malformed multipart body")
            .with_context(e.to_string())
            .into_static()
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .unwrap_or("unnamed")
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| {
            ErrorKind::InvalidRequest
                .with_message("Failed to read upload")
                .with_context(e.to_string())
                .into_static()
        })?;

        upload = Some((filename, content_type, bytes.to_vec()));
        break;
    }

    let Some((filename, content_type, bytes)) = upload else {
        return Err(ErrorKind::FileRequired.into_error());
    };

    let size_bytes = bytes.len() as i64;
    let storage_key = ObjectStore::new_key(path_params.record_id);
    storage.put(&storage_key, bytes).await.map_err(|e| {
        ErrorKind::InternalServerError.with_context(e.to_string()).into_static()
    })?;

    let attached = mutations
        .attach_file(
            &auth,
            path_params.record_id,
            path_params.field_id,
            filename,
            content_type,
            size_bytes,
            storage_key.clone(),
        )
        .await;

    match attached {
        Ok((attachment, _record)) => Ok((StatusCode::CREATED, Json(attachment.into()))),
        Err(err) => {
            // The row never landed; reclaim the blob.
            if let Err(cleanup_err) = storage.delete(&storage_key).await {
                tracing::warn!(
                    target: TRACING_TARGET,
                    storage_key = %storage_key,
                    error = %cleanup_err,
                    "failed to clean up blob after rejected upload"
                );
            }
            Err(err.into())
        }
    }
}

fn upload_attachment_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Upload attachment")
        .description("Multipart upload with file field `file` into an attachment cell.")
        .response::<201, Json<AttachmentInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns attachment metadata.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, attachment_id = %path_params.attachment_id))]
async fn read_attachment(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<AttachmentPathParams>,
) -> Result<(StatusCode, Json<AttachmentInfo>)> {
    let attachment = find_visible_attachment(&mut conn, &auth, path_params.attachment_id).await?;

    Ok((StatusCode::OK, Json(attachment.into())))
}

fn read_attachment_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get attachment metadata")
        .response::<200, Json<AttachmentInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Streams an attachment's bytes back.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, attachment_id = %path_params.attachment_id))]
async fn download_attachment(
    PgPool(mut conn): PgPool,
    State(storage): State<ObjectStore>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<AttachmentPathParams>,
) -> Result<Response> {
    let attachment = find_visible_attachment(&mut conn, &auth, path_params.attachment_id).await?;

    let bytes = storage.get(&attachment.storage_key).await.map_err(|e| {
        ErrorKind::InternalServerError.with_context(e.to_string()).into_static()
    })?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment.filename.replace('"', "_")
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, attachment.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

fn download_attachment_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Download attachment")
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes an attachment: row, cell entry, and blob.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, attachment_id = %path_params.attachment_id))]
async fn delete_attachment(
    State(mutations): State<MutationService>,
    State(storage): State<ObjectStore>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<AttachmentPathParams>,
) -> Result<StatusCode> {
    let storage_key = mutations
        .delete_attachment(&auth, path_params.attachment_id)
        .await?;

    if let Err(err) = storage.delete(&storage_key).await {
        tracing::warn!(
            target: TRACING_TARGET,
            storage_key = %storage_key,
            error = %err,
            "failed to delete attachment blob"
        );
    }

    Ok(StatusCode::NO_CONTENT)
}

fn delete_attachment_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete attachment")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Loads an attachment, hiding it unless the caller can see its record.
async fn find_visible_attachment(
    conn: &mut gridbase_postgres::PgConn,
    auth: &crate::extract::Identity,
    attachment_id: uuid::Uuid,
) -> Result<gridbase_postgres::model::Attachment, Error<'static>> {
    let attachment = conn
        .find_attachment_by_id(attachment_id)
        .await?
        .ok_or_else(|| {
            ErrorKind::NotFound.with_message("Attachment not found").into_static()
        })?;

    conn.find_record_for_user(attachment.record_id, auth.user_id)
        .await?
        .ok_or_else(|| {
            ErrorKind::NotFound.with_message("Attachment not found").into_static()
        })?;

    Ok(attachment)
}

/// Returns routes for attachment management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/records/{record_id}/fields/{field_id}/attachments",
            post_with(upload_attachment, upload_attachment_docs),
        )
        .api_route(
            "/attachments/{attachment_id}",
            get_with(read_attachment, read_attachment_docs)
                .delete_with(delete_attachment, delete_attachment_docs),
        )
        .api_route(
            "/attachments/{attachment_id}/download",
            get_with(download_attachment, download_attachment_docs),
        )
        .with_path_items(|item| item.tag("Attachments"))
}
