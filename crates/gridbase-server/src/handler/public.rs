//! Unauthenticated public routes: published views and submission forms.
//!
//! The opaque token in the path is the entire credential; a missing or
//! unknown token is the only failure mode exposed.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::query::{
    FieldRepository, FormRepository, Pagination, RecordRepository, ViewRepository,
};
use gridbase_postgres::types::FormField;

use crate::extract::{Json, Path, PgPool};
use crate::handler::request::{RecordValuesRequest, TokenPathParams};
use crate::handler::response::{
    ErrorResponse, FieldInfo, PublicFormInfo, PublicViewInfo, RecordInfo, SubmissionResponse,
};
use crate::handler::{ErrorKind, Result};
use crate::service::{MutationService, ServiceState};

/// Returns a published view with its fields and records.
#[tracing::instrument(skip_all)]
async fn read_public_view(
    PgPool(mut conn): PgPool,
    Path(path_params): Path<TokenPathParams>,
) -> Result<(StatusCode, Json<PublicViewInfo>)> {
    if path_params.token.trim().is_empty() {
        return Err(ErrorKind::TokenRequired.into_error());
    }

    let view = conn
        .find_view_by_public_token(&path_params.token)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("View not found").into_static())?;

    let fields = conn.list_fields_for_table(view.table_id).await?;
    let records = conn
        .list_records_for_table(view.table_id, Pagination::new(1000, 0))
        .await?;

    Ok((
        StatusCode::OK,
        Json(PublicViewInfo {
            name: view.display_name,
            view_type: view.view_type,
            config: view.config,
            fields: fields.into_iter().map(FieldInfo::from).collect(),
            records: records.into_iter().map(RecordInfo::from).collect(),
        }),
    ))
}

fn read_public_view_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get published view")
        .response::<200, Json<PublicViewInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns a form's public projection for rendering.
#[tracing::instrument(skip_all)]
async fn read_public_form(
    PgPool(mut conn): PgPool,
    Path(path_params): Path<TokenPathParams>,
) -> Result<(StatusCode, Json<PublicFormInfo>)> {
    if path_params.token.trim().is_empty() {
        return Err(ErrorKind::TokenRequired.into_error());
    }

    let form = conn
        .find_form_by_public_token(&path_params.token)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Form not found").into_static())?;

    // Join the form's field configuration with live field definitions so
    // renderers get names and types without a second round trip.
    let fields = conn.list_fields_for_table(form.table_id).await?;
    let form_fields = FormField::decode_list(&form.form_fields).unwrap_or_default();

    let mut rendered = Vec::new();
    for form_field in form_fields.iter().filter(|f| f.visible) {
        let Some(field) = fields.iter().find(|f| f.id == form_field.field_id) else {
            continue;
        };
        rendered.push(serde_json::json!({
            "field_id": form_field.field_id,
            "label": form_field.label.clone().unwrap_or_else(|| field.display_name.clone()),
            "type": field.field_type,
            "options": field.options,
            "required": form_field.required,
            "position": form_field.position,
        }));
    }

    Ok((
        StatusCode::OK,
        Json(PublicFormInfo {
            name: form.display_name,
            is_active: form.is_active,
            fields: serde_json::Value::Array(rendered),
        }),
    ))
}

fn read_public_form_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get public form")
        .response::<200, Json<PublicFormInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Accepts an unauthenticated form submission.
#[tracing::instrument(skip_all)]
async fn submit_public_form(
    State(mutations): State<MutationService>,
    Path(path_params): Path<TokenPathParams>,
    Json(request): Json<RecordValuesRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>)> {
    if path_params.token.trim().is_empty() {
        return Err(ErrorKind::TokenRequired.into_error());
    }

    let record = mutations
        .submit_public_form(&path_params.token, request.values)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            record_id: record.id,
        }),
    ))
}

fn submit_public_form_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Submit public form")
        .description("Validates required fields and types, then creates a record in the form's table.")
        .response::<201, Json<SubmissionResponse>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns the unauthenticated public routes.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/public/views/{token}",
            get_with(read_public_view, read_public_view_docs),
        )
        .api_route(
            "/public/forms/{token}",
            get_with(read_public_form, read_public_form_docs)
                .post_with(submit_public_form, submit_public_form_docs),
        )
        .with_path_items(|item| item.tag("Public"))
}
