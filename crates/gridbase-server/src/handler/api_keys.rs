//! API key management handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::http::StatusCode;
use gridbase_postgres::model::NewApiKey;
use gridbase_postgres::query::ApiKeyRepository;

use crate::extract::{AuthSession, Json, Path, PgPool, ValidateJson};
use crate::handler::request::{ApiKeyPathParams, CreateApiKeyRequest};
use crate::handler::response::{ApiKeyInfo, ApiKeyWithSecret, ErrorResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::{ServiceState, auth};

/// Tracing target for API key handlers.
const TRACING_TARGET: &str = "gridbase_server::handler::api_keys";

/// Creates an API key. The raw key appears in this response only.
#[tracing::instrument(skip_all, fields(user_id = %auth_session.user_id))]
async fn create_api_key(
    PgPool(mut conn): PgPool,
    AuthSession(auth_session): AuthSession,
    ValidateJson(request): ValidateJson<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<ApiKeyWithSecret>)> {
    let generated = auth::generate_api_key();

    let key = conn
        .create_api_key(NewApiKey {
            user_id: auth_session.user_id,
            display_name: request.name,
            key_digest: generated.digest,
            key_prefix: generated.prefix,
            scopes: request.scopes.into_iter().map(Some).collect(),
        })
        .await?;

    tracing::info!(target: TRACING_TARGET, key_id = %key.id, "API key created");

    Ok((
        StatusCode::CREATED,
        Json(ApiKeyWithSecret {
            info: key.into(),
            key: generated.raw,
        }),
    ))
}

fn create_api_key_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create API key")
        .description("The raw key is returned once; only its digest is stored.")
        .response::<201, Json<ApiKeyWithSecret>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Lists the caller's API keys.
#[tracing::instrument(skip_all, fields(user_id = %auth_session.user_id))]
async fn list_api_keys(
    PgPool(mut conn): PgPool,
    AuthSession(auth_session): AuthSession,
) -> Result<(StatusCode, Json<Vec<ApiKeyInfo>>)> {
    let keys = conn.list_api_keys_for_user(auth_session.user_id).await?;
    let keys: Vec<ApiKeyInfo> = keys.into_iter().map(Into::into).collect();

    Ok((StatusCode::OK, Json(keys)))
}

fn list_api_keys_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List API keys")
        .response::<200, Json<Vec<ApiKeyInfo>>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Destroys an API key. Owners destroy only their own keys.
#[tracing::instrument(skip_all, fields(user_id = %auth_session.user_id, key_id = %path_params.key_id))]
async fn delete_api_key(
    PgPool(mut conn): PgPool,
    AuthSession(auth_session): AuthSession,
    Path(path_params): Path<ApiKeyPathParams>,
) -> Result<StatusCode> {
    let key = conn
        .find_api_key_by_id(path_params.key_id)
        .await?
        .ok_or_else(|| ErrorKind::NotFound.with_message("API key not found").into_static())?;

    if key.user_id != auth_session.user_id {
        return Err(ErrorKind::NotFound.with_message("API key not found").into_static());
    }

    conn.delete_api_key(path_params.key_id).await?;

    tracing::info!(target: TRACING_TARGET, key_id = %path_params.key_id, "API key destroyed");

    Ok(StatusCode::NO_CONTENT)
}

fn delete_api_key_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete API key")
        .response::<204, ()>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for API key management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/api-keys",
            post_with(create_api_key, create_api_key_docs)
                .get_with(list_api_keys, list_api_keys_docs),
        )
        .api_route(
            "/api-keys/{key_id}",
            delete_with(delete_api_key, delete_api_key_docs),
        )
        .with_path_items(|item| item.tag("API keys"))
}
