//! Webhook management handlers.
//!
//! Registrations are managed here; actual delivery is driven off the event
//! bus by the webhook worker. The test endpoint reuses the worker's
//! deliver-and-record path so test deliveries land in the same audit trail.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_postgres::PgClient;
use gridbase_postgres::query::{WebhookDeliveryRepository, WebhookRepository};
use gridbase_postgres::types::{CollaboratorRole, EventType};
use gridbase_webhook::{WebhookRequest, WebhookService};

use crate::extract::{AuthSession, Json, Path, PgPool, Query, ValidateJson};
use crate::handler::request::{
    BasePathParams, CreateWebhookRequest, PaginationQuery, UpdateWebhookRequest,
    WebhookPathParams,
};
use crate::handler::response::{DeliveryInfo, ErrorResponse, MessageResponse, WebhookInfo};
use crate::handler::{ErrorKind, Result};
use crate::service::{MutationService, ServiceState};
use crate::worker::webhook::deliver_and_record;

/// Registers a webhook on a base.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn create_webhook(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
    ValidateJson(request): ValidateJson<CreateWebhookRequest>,
) -> Result<(StatusCode, Json<WebhookInfo>)> {
    let webhook = mutations
        .create_webhook(
            &auth,
            path_params.base_id,
            &request.name,
            &request.url,
            request.events,
            request.secret,
            request.is_active,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(webhook.into())))
}

fn create_webhook_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create webhook")
        .response::<201, Json<WebhookInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Lists a base's webhooks.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, base_id = %path_params.base_id))]
async fn list_webhooks(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<BasePathParams>,
) -> Result<(StatusCode, Json<Vec<WebhookInfo>>)> {
    auth.require_role(&mut conn, path_params.base_id, CollaboratorRole::Viewer)
        .await?;

    let webhooks = conn.list_webhooks_for_base(path_params.base_id).await?;
    let webhooks: Vec<WebhookInfo> = webhooks.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(webhooks)))
}

fn list_webhooks_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List webhooks")
        .response::<200, Json<Vec<WebhookInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
}

/// Updates a webhook.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, webhook_id = %path_params.webhook_id))]
async fn update_webhook(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<WebhookPathParams>,
    ValidateJson(request): ValidateJson<UpdateWebhookRequest>,
) -> Result<(StatusCode, Json<WebhookInfo>)> {
    let webhook = mutations
        .update_webhook(
            &auth,
            path_params.webhook_id,
            request.name.as_deref(),
            request.url.as_deref(),
            request.events,
            request.secret,
            request.is_active,
        )
        .await?;

    Ok((StatusCode::OK, Json(webhook.into())))
}

fn update_webhook_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update webhook")
        .response::<200, Json<WebhookInfo>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Deletes a webhook.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, webhook_id = %path_params.webhook_id))]
async fn delete_webhook(
    State(mutations): State<MutationService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<WebhookPathParams>,
) -> Result<StatusCode> {
    mutations.delete_webhook(&auth, path_params.webhook_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn delete_webhook_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete webhook")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Lists a webhook's delivery history, newest first.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, webhook_id = %path_params.webhook_id))]
async fn list_deliveries(
    PgPool(mut conn): PgPool,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<WebhookPathParams>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<(StatusCode, Json<Vec<DeliveryInfo>>)> {
    let webhook = conn
        .find_webhook_by_id(path_params.webhook_id)
        .await?
        .ok_or_else(|| {
            ErrorKind::NotFound.with_message("Webhook not found").into_static()
        })?;
    auth.require_role(&mut conn, webhook.base_id, CollaboratorRole::Viewer)
        .await?;

    let deliveries = conn
        .list_webhook_deliveries(path_params.webhook_id, pagination.into())
        .await?;
    let deliveries: Vec<DeliveryInfo> = deliveries.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(deliveries)))
}

fn list_deliveries_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List deliveries")
        .description("The append-only per-attempt audit trail.")
        .response::<200, Json<Vec<DeliveryInfo>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Sends a signed test delivery to a webhook.
#[tracing::instrument(skip_all, fields(user_id = %auth.user_id, webhook_id = %path_params.webhook_id))]
async fn test_webhook(
    PgPool(mut conn): PgPool,
    State(pg_client): State<PgClient>,
    State(webhook_service): State<WebhookService>,
    AuthSession(auth): AuthSession,
    Path(path_params): Path<WebhookPathParams>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let webhook = conn
        .find_webhook_by_id(path_params.webhook_id)
        .await?
        .ok_or_else(|| {
            ErrorKind::NotFound.with_message("Webhook not found").into_static()
        })?;
    auth.require_role(&mut conn, webhook.base_id, CollaboratorRole::Editor)
        .await?;

    let url = webhook.url.parse().map_err(|_| {
        ErrorKind::InvalidRequest
            .with_message("Webhook URL is not valid")
            .into_static()
    })?;

    let mut request = WebhookRequest::test(webhook.id, url, webhook.base_id);
    if let Some(secret) = webhook.secret {
        request = request.with_secret(secret);
    }

    // The test delivery runs in the background like any other delivery
    // and records its own row.
    tokio::spawn(deliver_and_record(
        pg_client,
        webhook_service,
        EventType::WebhookTest,
        request,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("Test delivery queued.")),
    ))
}

fn test_webhook_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Send test delivery")
        .response::<202, Json<MessageResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<403, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for webhook management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/bases/{base_id}/webhooks",
            post_with(create_webhook, create_webhook_docs)
                .get_with(list_webhooks, list_webhooks_docs),
        )
        .api_route(
            "/webhooks/{webhook_id}",
            patch_with(update_webhook, update_webhook_docs)
                .delete_with(delete_webhook, delete_webhook_docs),
        )
        .api_route(
            "/webhooks/{webhook_id}/deliveries",
            get_with(list_deliveries, list_deliveries_docs),
        )
        .api_route(
            "/webhooks/{webhook_id}/test",
            post_with(test_webhook, test_webhook_docs),
        )
        .with_path_items(|item| item.tag("Webhooks"))
}
