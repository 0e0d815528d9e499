//! Automation management handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::query::{
    AutomationRepository, AutomationRunRepository, TableRepository,
};
use gridbase_postgres::types::CollaboratorRole;

use crate::extract::{AuthSession, Json, Path, PgPool, Query, ValidateJson};
use crate::handler::request::{
    AutomationPathParams, CreateAutomationRequest, PaginationQuery, TablePathParams,
    UpdateAutomationRequest,
};
use crate::handler::response::{AutomationInfo, ErrorResponse, RunInfo};
use crate::handler::{ErrorKind, Result};
use crate::service::{MutationService, ServiceState};

/// Creates an automation on a table.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn create_automation(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
    ValidateJson(request): ValidateJson<CreateAutomationRequest>,
) -> Result<(StatusCode, Json<AutomationInfo>)> {
    let automation = mutations
        .create_automation(
            &auth,
            path_params.table_id,
            &request.name,
            request.trigger_type,
            request.trigger_config,
            request.action_type,
            request.action_config,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(automation.into())))
}

fn create_automation_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create automation")
        .response::<201, Json<AutomationInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Lists a table's automations.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, table_id = %path_params.table_id))]
async fn list_automations(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<TablePathParams>,
) -> Result<(StatusCode, Json<Vec<AutomationInfo>>)> {
    let table = conn
        .find_table_by_id(path_params.table_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Table not found").into_static())?;
    auth.require_role(&mut conn, table.base_id, CollaboratorRole::Viewer)
        .await?;

    let automations = conn.list_automations_for_table(path_params.table_id).await?;
    let automations: Vec<AutomationInfo> = automations.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(automations)))
}

fn list_automations_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List automations")
        .response::<200, Json<Vec<AutomationInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Updates an automation.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, automation_id = %path_params.automation_id))]
async fn update_automation(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<AutomationPathParams>,
    ValidateJson(request): ValidateJson<UpdateAutomationRequest>,
) -> Result<(StatusCode, Json<AutomationInfo>)> {
    let trigger = match (request.trigger_type, request.trigger_config) {
        (Some(trigger_type), Some(config)) => Some((trigger_type, config)),
        (Some(trigger_type), None) => Some((trigger_type, serde_json::json!({}))),
        (None, Some(_)) => {
            return Err(ErrorKind::InvalidRequest
                .with_message("trigger_config requires trigger_type")
                .into_static());
        }
        (None, None) => None,
    };
    let action = match (request.action_type, request.action_config) {
        (Some(action_type), Some(config)) => Some((action_type, config)),
        (Some(action_type), None) => Some((action_type, serde_json::json!({}))),
        (None, Some(_)) => {
            return Err(ErrorKind::InvalidRequest
                .with_message("action_config requires action_type")
                .into_static());
        }
        (None, None) => None,
    };

    let automation = mutations
        .update_automation(
            &auth,
            path_params.automation_id,
            request.name.as_deref(),
            request.is_enabled,
            trigger,
            action,
        )
        .await?;

    Ok((StatusCode::OK, Json(automation.into())))
}

fn update_automation_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update automation")
        .response::<200, Json<AutomationInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Flips an automation's enabled flag.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, automation_id = %path_params.automation_id))]
async fn toggle_automation(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<AutomationPathParams>,
) -> Result<(StatusCode, Json<AutomationInfo>)> {
    let automation = mutations
        .toggle_automation(&auth, path_params.automation_id)
        .await?;

    Ok((StatusCode::OK, Json(automation.into())))
}

fn toggle_automation_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Toggle automation")
        .response::<200, Json<AutomationInfo>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes an automation.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, automation_id = %path_params.automation_id))]
async fn delete_automation(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<AutomationPathParams>,
) -> Result<StatusCode> {
    mutations
        .delete_automation(&auth, path_params.automation_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn delete_automation_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete automation")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Lists an automation's run history, newest first.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, automation_id = %path_params.automation_id))]
async fn list_runs(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<AutomationPathParams>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<(StatusCode, Json<Vec<RunInfo>>)> {
    let automation = conn
        .find_automation_by_id(path_params.automation_id)
        .await?
        .ok_or_else(|| {
            ErrorKind::NotFound.with_message("Automation not found").into_static()
        })?;
    let table = conn
        .find_table_by_id(automation.table_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("Table not found").into_static())?;
    auth.require_role(&mut conn, table.base_id, CollaboratorRole::Viewer)
        .await?;

    let runs = conn
        .list_automation_runs(path_params.automation_id, pagination.into())
        .await?;
    let runs: Vec<RunInfo> = runs.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(runs)))
}

fn list_runs_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List automation runs")
        .response::<200, Json<Vec<RunInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for automation management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/tables/{table_id}/automations",
            post_with(create_automation, create_automation_docs)
                .get_with(list_automations, list_automations_docs),
        )
        .api_route(
            "/automations/{automation_id}",
            patch_with(update_automation, update_automation_docs)
                .delete_with(delete_automation, delete_automation_docs),
        )
        .api_route(
            "/automations/{automation_id}/toggle",
            post_with(toggle_automation, toggle_automation_docs),
        )
        .api_route(
            "/automations/{automation_id}/runs",
            get_with(list_runs, list_runs_docs),
        )
        .with_path_items(|item| item.tag("Automations"))
}
