//! Webhook delivery model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::webhook_deliveries;
use crate::types::EventType;

/// The recorded outcome of one delivery attempt.
///
/// One row is written per attempt, success or failure; rows are append-only
/// and form the delivery audit trail.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = webhook_deliveries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WebhookDelivery {
    /// Unique delivery identifier.
    pub id: Uuid,
    /// The webhook this delivery was sent to.
    pub webhook_id: Uuid,
    /// The event type delivered.
    pub event: EventType,
    /// Snapshot of the payload that was sent.
    pub payload: serde_json::Value,
    /// HTTP status returned by the endpoint, if a response was received.
    pub response_status: Option<i32>,
    /// Response body, truncated to the capture cap.
    pub response_body: Option<String>,
    /// Error description for failed deliveries.
    pub error: Option<String>,
    /// Wall-clock duration of the HTTP call in milliseconds.
    pub duration_ms: i64,
    /// Timestamp when the attempt was recorded.
    pub created_at: Timestamp,
}

impl WebhookDelivery {
    /// Returns whether the delivery received a 2xx response.
    pub fn is_success(&self) -> bool {
        self.response_status
            .is_some_and(|status| (200..300).contains(&status))
    }
}

/// Data for recording a delivery attempt.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = webhook_deliveries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWebhookDelivery {
    /// The webhook the delivery was sent to.
    pub webhook_id: Uuid,
    /// The delivered event type.
    pub event: EventType,
    /// Snapshot of the sent payload.
    pub payload: serde_json::Value,
    /// HTTP status, if a response was received.
    pub response_status: Option<i32>,
    /// Truncated response body.
    pub response_body: Option<String>,
    /// Error description for failures.
    pub error: Option<String>,
    /// HTTP call duration in milliseconds.
    pub duration_ms: i64,
}
