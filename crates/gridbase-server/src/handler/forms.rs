//! Form management handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::query::{FormRepository, TableRepository};
use gridbase_postgres::types::CollaboratorRole;

use crate::extract::{AuthSession, Json, Path, PgPool, ValidateJson};
use crate::handler::request::{
    CreateFormRequest, FormPathParams, TablePathParams, UpdateFormFieldsRequest,
    UpdateFormRequest,
};
use crate::handler::response::{ErrorResponse, FormInfo};
use crate::handler::{ErrorKind, Result};
use crate::service::{MutationService, ServiceState};

/// Creates a form over a table.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn create_form(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    ValidateJson(request): ValidateJson<CreateFormRequest>,
) -> Result<(StatusCode, Json<FormInfo>)> {
    let form = mutations
        .create_form(&auth, path_params.table_id, &request.name, request.fields)
        .await?;

    Ok((StatusCode::CREATED, Json(form.into())))
}

fn create_form_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create form")
        .description("Creates a form with a globally-unique public token.")
        .response::<201, Json<FormInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Lists a table's forms.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn list_forms(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
) -> Result<(StatusCode, Json<Vec<FormInfo>>)> {
    let table = conn
        .find_table_by_id(path_params.table_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Table not found").into_static())?;
    auth.require_role(&mut conn, table.base_id, CollaboratorRole::Viewer)
        .await?;

    let forms = conn.list_forms_for_table(path_params.table_id).await?;
    let forms: Vec<FormInfo> = forms.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(forms)))
}

fn list_forms_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List forms")
        .response::<200, Json<Vec<FormInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Updates a form's name or active flag.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, form_id = %path_params.form_id))]
async fn update_form(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<FormPathParams>,
    ValidateJson(request): ValidateJson<UpdateFormRequest>,
) -> Result<(StatusCode, Json<FormInfo>)> {
    let form = mutations
        .update_form(
            &auth,
            path_params.form_id,
            request.name.as_deref(),
            request.is_active,
        )
        .await?;

    Ok((StatusCode::OK, Json(form.into())))
}

fn update_form_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update form")
        .response::<200, Json<FormInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Replaces a form's field configuration.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, form_id = %path_params.form_id))]
async fn update_form_fields(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<FormPathParams>,
    Json(request): Json<UpdateFormFieldsRequest>,
) -> Result<(StatusCode, Json<FormInfo>)> {
    let form = mutations
        .update_form_fields(&auth, path_params.form_id, request.fields)
        .await?;

    Ok((StatusCode::OK, Json(form.into())))
}

fn update_form_fields_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update form fields")
        .response::<200, Json<FormInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a form.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, form_id = %path_params.form_id))]
async fn delete_form(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<FormPathParams>,
) -> Result<StatusCode> {
    mutations.delete_form(&auth, path_params.form_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn delete_form_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete form")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for form management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/tables/{table_id}/forms",
            post_with(create_form, create_form_docs).get_with(list_forms, list_forms_docs),
        )
        .api_route(
            "/forms/{form_id}",
            patch_with(update_form, update_form_docs).delete_with(delete_form, delete_form_docs),
        )
        .api_route(
            "/forms/{form_id}/fields",
            put_with(update_form_fields, update_form_fields_docs),
        )
        .with_path_items(|item| item.tag("Forms"))
}
