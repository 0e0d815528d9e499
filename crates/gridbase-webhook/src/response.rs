//! Webhook delivery response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response from a webhook delivery attempt that reached the endpoint.
///
/// Transport failures (DNS, connect, timeout) surface as errors from the
/// provider instead; a `WebhookResponse` always carries a real HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// Request ID this response corresponds to.
    pub request_id: Uuid,
    /// HTTP status code returned by the webhook endpoint.
    pub status_code: u16,
    /// Response body, truncated to [`MAX_CAPTURED_BODY_BYTES`].
    ///
    /// [`MAX_CAPTURED_BODY_BYTES`]: crate::MAX_CAPTURED_BODY_BYTES
    pub body: String,
    /// Timestamp when the request was initiated.
    pub started_at: Timestamp,
    /// Timestamp when the response was received.
    pub finished_at: Timestamp,
}

impl WebhookResponse {
    /// Creates a new webhook response.
    pub fn new(request_id: Uuid, status_code: u16, body: String, started_at: Timestamp) -> Self {
        Self {
            request_id,
            status_code,
            body,
            started_at,
            finished_at: Timestamp::now(),
        }
    }

    /// Returns whether the delivery was successful (2xx status code).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns the error string recorded for non-success responses.
    pub fn error_message(&self) -> Option<String> {
        if self.is_success() {
            None
        } else {
            Some(format!("non-success status code: {}", self.status_code))
        }
    }

    /// Returns the wall-clock duration of the HTTP call in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        self.started_at
            .until(self.finished_at)
            .map(|span| span.total(jiff::Unit::Millisecond).unwrap_or(0.0) as i64)
            .unwrap_or(0)
            .max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response() {
        let request_id = Uuid::new_v4();
        let response = WebhookResponse::new(request_id, 200, String::new(), Timestamp::now());

        assert!(response.is_success());
        assert_eq!(response.request_id, request_id);
        assert_eq!(response.error_message(), None);
        assert!(response.duration_ms() >= 0);
    }

    #[test]
    fn failure_records_error_string() {
        let response =
            WebhookResponse::new(Uuid::new_v4(), 500, "oops".to_string(), Timestamp::now());

        assert!(!response.is_success());
        assert_eq!(response.body, "oops");
        assert_eq!(
            response.error_message().as_deref(),
            Some("non-success status code: 500")
        );
    }

    #[test]
    fn redirects_are_not_success() {
        let response = WebhookResponse::new(Uuid::new_v4(), 301, String::new(), Timestamp::now());
        assert!(!response.is_success());
    }
}
