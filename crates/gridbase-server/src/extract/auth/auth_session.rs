//! Authenticated-caller extractor with database verification.
//!
//! [`AuthSession`] resolves `Authorization: Bearer <session-token>` or
//! `X-API-Key: <raw-key>` against the session and API-key stores. Both
//! tokens are opaque: the server stores only SHA-256 digests, so resolution
//! is a digest lookup plus an account fetch. Successful extraction is
//! cached in request extensions, so stacked extractors verify once.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use derive_more::{Deref, DerefMut};
use gridbase_postgres::PgClient;
use gridbase_postgres::query::{ApiKeyRepository, SessionRepository, UserRepository};
use sha2::{Digest, Sha256};

use super::{AccessKind, Identity};
use crate::TRACING_TARGET_AUTHENTICATION;
use crate::handler::{Error, ErrorKind, Result};

/// The authenticated caller, verified against the database.
///
/// Extraction fails with `unauthorized` when no credential is presented,
/// the credential does not resolve, or the session has expired.
#[derive(Debug, Clone, Deref, DerefMut)]
#[must_use]
pub struct AuthSession(pub Identity);

impl AuthSession {
    /// Returns the verified identity.
    pub fn into_identity(self) -> Identity {
        self.0
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    PgClient: FromRef<S>,
    S: Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        // Reuse the identity when another extractor already verified it.
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(Self(identity.clone()));
        }

        let pg_client = PgClient::from_ref(state);

        let identity = if let Some(token) = bearer_token(parts) {
            resolve_session_token(&pg_client, token).await?
        } else if let Some(key) = api_key_header(parts) {
            resolve_api_key(&pg_client, key).await?
        } else {
            return Err(ErrorKind::Unauthorized
                .with_context("no bearer token or API key presented")
                .into_static());
        };

        parts.extensions.insert(identity.clone());
        Ok(Self(identity))
    }
}

impl aide::OperationInput for AuthSession {}

/// Extracts the bearer token from the `Authorization` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extracts the raw key from the `X-API-Key` header.
fn api_key_header(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("x-api-key")?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

/// Computes the storage digest of an opaque token.
pub fn token_digest(raw: &str) -> Vec<u8> {
    Sha256::digest(raw.as_bytes()).to_vec()
}

/// Resolves an opaque session token into a verified identity.
///
/// Shared by the header extractor and the websocket upgrade path, which
/// receives the token as a query parameter.
pub async fn resolve_session_token(
    pg_client: &PgClient,
    token: &str,
) -> Result<Identity, Error<'static>> {
    let mut conn = pg_client.get_connection().await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_AUTHENTICATION,
            error = %err,
            "failed to acquire connection for authentication"
        );
        ErrorKind::InternalServerError.with_context(err.to_string()).into_static()
    })?;

    let digest = token_digest(token);
    let Some(session) = conn.find_live_session_by_digest(&digest).await? else {
        tracing::debug!(
            target: TRACING_TARGET_AUTHENTICATION,
            "session token did not resolve"
        );
        return Err(ErrorKind::Unauthorized.into_error());
    };

    let Some(user) = conn.find_user_by_id(session.user_id).await? else {
        tracing::warn!(
            target: TRACING_TARGET_AUTHENTICATION,
            session_id = %session.id,
            "session references a missing account"
        );
        return Err(ErrorKind::Unauthorized.into_error());
    };

    // Post-commit bookkeeping; failure must not reject the request.
    if let Err(err) = conn.touch_session(session.id).await {
        tracing::warn!(
            target: TRACING_TARGET_AUTHENTICATION,
            error = %err,
            "failed to record session use"
        );
    }

    tracing::debug!(
        target: TRACING_TARGET_AUTHENTICATION,
        user_id = %user.id,
        session_id = %session.id,
        "session authenticated"
    );

    Ok(Identity {
        user_id: user.id,
        email: user.email_address,
        display_name: user.display_name,
        access: AccessKind::Session {
            session_id: session.id,
        },
        causal_depth: 0,
    })
}

/// Resolves a raw API key into a verified identity.
pub async fn resolve_api_key(
    pg_client: &PgClient,
    raw_key: &str,
) -> Result<Identity, Error<'static>> {
    let mut conn = pg_client.get_connection().await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_AUTHENTICATION,
            error = %err,
            "failed to acquire connection for authentication"
        );
        ErrorKind::InternalServerError.with_context(err.to_string()).into_static()
    })?;

    let digest = token_digest(raw_key);
    let Some(api_key) = conn.find_api_key_by_digest(&digest).await? else {
        tracing::debug!(
            target: TRACING_TARGET_AUTHENTICATION,
            "API key did not resolve"
        );
        return Err(ErrorKind::Unauthorized.into_error());
    };

    let Some(user) = conn.find_user_by_id(api_key.user_id).await? else {
        tracing::warn!(
            target: TRACING_TARGET_AUTHENTICATION,
            key_id = %api_key.id,
            "API key references a missing account"
        );
        return Err(ErrorKind::Unauthorized.into_error());
    };

    if let Err(err) = conn.touch_api_key(api_key.id).await {
        tracing::warn!(
            target: TRACING_TARGET_AUTHENTICATION,
            error = %err,
            "failed to record API key use"
        );
    }

    tracing::debug!(
        target: TRACING_TARGET_AUTHENTICATION,
        user_id = %user.id,
        key_id = %api_key.id,
        "API key authenticated"
    );

    let scopes = api_key.scopes.iter().flatten().copied().collect();

    Ok(Identity {
        user_id: user.id,
        email: user.email_address,
        display_name: user.display_name,
        access: AccessKind::ApiKey {
            key_id: api_key.id,
            scopes,
        },
        causal_depth: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_token_free() {
        let digest = token_digest("secret-token");
        assert_eq!(digest.len(), 32);
        assert_eq!(digest, token_digest("secret-token"));
        assert_ne!(digest, token_digest("secret-token2"));
    }
}
