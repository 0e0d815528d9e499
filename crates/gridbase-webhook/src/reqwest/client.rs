//! Reqwest-based HTTP client for webhook delivery.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use jiff::Timestamp;
use reqwest::Client;
use sha2::Sha256;

use super::{Error, ReqwestConfig, TRACING_TARGET};
use crate::{
    MAX_CAPTURED_BODY_BYTES, ServiceHealth, WebhookProvider, WebhookRequest, WebhookResponse,
    WebhookService,
};

type HmacSha256 = Hmac<Sha256>;

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client for delivering webhook payloads to external
/// endpoints.
///
/// Implements the [`WebhookProvider`] trait with HMAC-SHA256 request
/// signing: when a request carries a secret, the signature of the exact
/// body bytes is sent as `X-Webhook-Signature: sha256=<hex>`.
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    pub fn new(config: ReqwestConfig) -> Self {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .expect("failed to create HTTP client");

        let inner = ReqwestClientInner { http, config };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into a [`WebhookService`] for dependency injection.
    pub fn into_service(self) -> WebhookService {
        WebhookService::new(self)
    }

    /// Signs a payload using HMAC-SHA256 over the raw body bytes.
    ///
    /// Receivers verify by recomputing the MAC over the request body they
    /// read off the wire, before any JSON parsing.
    pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(payload);

        let result = mac.finalize();
        hex::encode(result.into_bytes())
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new(ReqwestConfig::default())
    }
}

#[async_trait::async_trait]
impl WebhookProvider for ReqwestClient {
    async fn deliver(&self, request: &WebhookRequest) -> crate::Result<WebhookResponse> {
        let started_at = Timestamp::now();
        let timestamp = started_at.as_second();

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            url = %request.url,
            event = %request.payload.event,
            "Delivering webhook"
        );

        // Serialize once; these exact bytes are signed and sent.
        let payload_bytes = request.payload.to_body().map_err(Error::Serde)?;

        let timeout = request.timeout.unwrap_or_else(|| self.config().timeout());

        let mut http_request = self
            .http()
            .post(request.url.as_str())
            .header("Content-Type", "application/json")
            .header("X-Webhook-Event", &request.payload.event)
            .header("X-Webhook-Id", request.webhook_id.to_string())
            .header("X-Webhook-Timestamp", timestamp.to_string())
            .timeout(timeout);

        if let Some(ref secret) = request.secret {
            let signature = Self::sign_payload(secret, &payload_bytes);
            http_request =
                http_request.header("X-Webhook-Signature", format!("sha256={}", signature));
        }

        let http_response = http_request
            .body(payload_bytes)
            .send()
            .await
            .map_err(Error::from)?;

        let status_code = http_response.status().as_u16();
        let body_bytes = http_response.bytes().await.map_err(Error::from)?;
        let captured = body_bytes
            .get(..body_bytes.len().min(MAX_CAPTURED_BODY_BYTES))
            .unwrap_or_default();
        let body = String::from_utf8_lossy(captured).into_owned();

        let response = WebhookResponse::new(request.request_id, status_code, body, started_at);

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            status_code,
            success = response.is_success(),
            duration_ms = response.duration_ms(),
            "Webhook delivery completed"
        );

        Ok(response)
    }

    async fn health_check(&self) -> crate::Result<ServiceHealth> {
        // The client is stateless and always healthy if it was created successfully.
        Ok(ServiceHealth::healthy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_payload_is_deterministic() {
        let secret = "test_secret";
        let payload = b"{\"event\":\"record.created\"}";

        let first = ReqwestClient::sign_payload(secret, payload);
        let second = ReqwestClient::sign_payload(secret, payload);

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sign_payload_matches_reference_hmac() {
        use hmac::Mac;

        let secret = "s";
        let payload = b"{\"event\":\"record.created\",\"base_id\":\"b\"}";

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(ReqwestClient::sign_payload(secret, payload), expected);
    }

    #[test]
    fn different_secrets_produce_different_signatures() {
        let payload = b"{}";
        let a = ReqwestClient::sign_payload("alpha", payload);
        let b = ReqwestClient::sign_payload("beta", payload);
        assert_ne!(a, b);
    }
}
