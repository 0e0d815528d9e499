//! Webhook delivery request and payload types.

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// A webhook delivery request.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Unique identifier for this request.
    pub request_id: Uuid,
    /// The webhook configuration this delivery belongs to.
    pub webhook_id: Uuid,
    /// The webhook endpoint URL.
    pub url: Url,
    /// The payload posted to the endpoint.
    pub payload: WebhookPayload,
    /// Shared secret for HMAC signing; no signature header when absent.
    pub secret: Option<String>,
    /// Optional request timeout (uses client default if not set).
    pub timeout: Option<Duration>,
}

impl WebhookRequest {
    /// Creates a new webhook request.
    pub fn new(webhook_id: Uuid, url: Url, payload: WebhookPayload) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            webhook_id,
            url,
            payload,
            secret: None,
            timeout: None,
        }
    }

    /// Creates a test request for operator-initiated webhook testing.
    pub fn test(webhook_id: Uuid, url: Url, base_id: Uuid) -> Self {
        Self::new(webhook_id, url, WebhookPayload::test(base_id))
    }

    /// Sets the signing secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The JSON payload posted to webhook endpoints.
///
/// The serialized bytes of this structure are exactly the bytes the
/// HMAC-SHA256 signature is computed over; receivers verify against the raw
/// request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct WebhookPayload {
    /// The event type that triggered this delivery (e.g. `record.created`).
    pub event: String,

    /// Timestamp when the event was committed.
    #[cfg_attr(feature = "schema", schemars(with = "String"))]
    pub timestamp: Timestamp,

    /// The base where the event occurred.
    pub base_id: Uuid,

    /// The affected table, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<Uuid>,

    /// The affected record, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,

    /// Snapshot of the new entity state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<serde_json::Value>,

    /// Previous record values; present only for record updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_record: Option<serde_json::Value>,

    /// The account that triggered the event, if any.
    pub user_id: Option<Uuid>,
}

impl WebhookPayload {
    /// Creates a payload with only the required fields set.
    pub fn new(event: impl Into<String>, base_id: Uuid) -> Self {
        Self {
            event: event.into(),
            timestamp: Timestamp::now(),
            base_id,
            table_id: None,
            record_id: None,
            record: None,
            old_record: None,
            user_id: None,
        }
    }

    /// Creates a test payload for webhook testing.
    pub fn test(base_id: Uuid) -> Self {
        Self::new("webhook.test", base_id)
    }

    /// Sets the affected table.
    pub fn with_table(mut self, table_id: Uuid) -> Self {
        self.table_id = Some(table_id);
        self
    }

    /// Sets the affected record.
    pub fn with_record_id(mut self, record_id: Uuid) -> Self {
        self.record_id = Some(record_id);
        self
    }

    /// Attaches the new entity state.
    pub fn with_record(mut self, record: serde_json::Value) -> Self {
        self.record = Some(record);
        self
    }

    /// Attaches the previous record values.
    pub fn with_old_record(mut self, old_record: serde_json::Value) -> Self {
        self.old_record = Some(old_record);
        self
    }

    /// Sets the acting user.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Serializes the payload into the exact bytes that are signed and sent.
    pub fn to_body(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_creation() {
        let webhook_id = Uuid::now_v7();
        let base_id = Uuid::now_v7();
        let url = Url::parse("https://example.com/webhook").unwrap();

        let payload = WebhookPayload::new("record.created", base_id);
        let request = WebhookRequest::new(webhook_id, url.clone(), payload);

        assert_eq!(request.url, url);
        assert_eq!(request.webhook_id, webhook_id);
        assert_eq!(request.payload.event, "record.created");
        assert!(request.secret.is_none());
        assert!(request.timeout.is_none());
    }

    #[test]
    fn optional_fields_are_omitted_from_body() {
        let payload = WebhookPayload::new("record.deleted", Uuid::new_v4());
        let body = payload.to_body().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert!(json.get("record_id").is_none());
        assert!(json.get("record").is_none());
        assert!(json.get("old_record").is_none());
        // user_id stays present (as null) so receivers can rely on the key.
        assert!(json.get("user_id").is_some());
    }

    #[test]
    fn old_record_only_set_for_updates() {
        let payload = WebhookPayload::new("record.updated", Uuid::new_v4())
            .with_record(serde_json::json!({"values": {"f1": 42}}))
            .with_old_record(serde_json::json!({"values": {"f1": 1}}));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["old_record"]["values"]["f1"], 1);
        assert_eq!(json["record"]["values"]["f1"], 42);
    }

    #[test]
    fn test_payload_shape() {
        let base_id = Uuid::new_v4();
        let payload = WebhookPayload::test(base_id);
        assert_eq!(payload.event, "webhook.test");
        assert_eq!(payload.base_id, base_id);
    }
}
