//! Connection metadata extractors.

use std::convert::Infallible;
use std::net::IpAddr;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

/// Client connection metadata captured on session creation.
///
/// The IP resolves through `axum-client-ip` when its source extension is
/// configured by the entry point; extraction never fails, it just yields
/// `None` fields.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    /// The client's IP address, when resolvable.
    pub ip: Option<IpAddr>,
    /// The client's user agent, bounded for storage.
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ip = <axum_client_ip::ClientIp as FromRequestParts<S>>::from_request_parts(
            parts, state,
        )
        .await
        .ok()
        .map(|client_ip| client_ip.0);

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(|agent| agent.chars().take(512).collect());

        Ok(Self { ip, user_agent })
    }
}

impl aide::OperationInput for ClientMeta {}

/// The bearer token of the request, when one was presented.
///
/// Unlike [`AuthSession`], extraction never fails; used by logout, which
/// must stay idempotent even with a stale token.
///
/// [`AuthSession`]: crate::extract::AuthSession
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        Ok(Self(token))
    }
}

impl aide::OperationInput for BearerToken {}
