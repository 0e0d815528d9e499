//! Webhook delivery worker.
//!
//! Consumes committed-mutation events from the bus, matches them to active
//! webhook registrations, and dispatches deliveries. Each delivery runs on
//! its own task so a slow endpoint never blocks the consume loop, and each
//! attempt persists exactly one delivery row, success or failure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gridbase_events::{BaseEvent, EventBus};
use gridbase_postgres::PgClient;
use gridbase_postgres::model::NewWebhookDelivery;
use gridbase_postgres::query::{WebhookDeliveryRepository, WebhookRepository};
use gridbase_webhook::{WebhookPayload, WebhookRequest, WebhookService};
use tokio_util::sync::CancellationToken;

/// Tracing target for webhook worker operations.
const TRACING_TARGET: &str = "gridbase_server::worker::webhook";

/// Idle poll interval of the consume loop.
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Webhook delivery worker.
///
/// Subscribes to the event firehose and delivers signed payloads to every
/// matching registration.
pub struct WebhookWorker {
    pg_client: PgClient,
    bus: EventBus,
    webhook_service: WebhookService,
}

impl WebhookWorker {
    /// Creates a new webhook worker.
    pub fn new(pg_client: PgClient, bus: EventBus, webhook_service: WebhookService) -> Self {
        Self {
            pg_client,
            bus,
            webhook_service,
        }
    }

    /// Runs the worker until cancelled or the bus closes.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(target: TRACING_TARGET, "starting webhook worker");

        let mut stream = self.bus.subscribe_all();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(target: TRACING_TARGET, "webhook worker shutdown requested");
                    break;
                }
                result = stream.next_with_timeout(POLL_TIMEOUT) => {
                    match result {
                        Ok(Some(event)) => self.dispatch(event).await,
                        Ok(None) => continue,
                        Err(_closed) => {
                            tracing::info!(target: TRACING_TARGET, "event bus closed");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!(target: TRACING_TARGET, "webhook worker stopped");
    }

    /// Matches one event against registrations and spawns deliveries.
    async fn dispatch(&self, event: Arc<BaseEvent>) {
        let webhooks = {
            let mut conn = match self.pg_client.get_connection().await {
                Ok(conn) => conn,
                Err(err) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %err,
                        "failed to acquire connection for webhook matching"
                    );
                    return;
                }
            };

            match conn.find_webhooks_for_event(event.base_id, event.event).await {
                Ok(webhooks) => webhooks,
                Err(err) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %err,
                        base_id = %event.base_id,
                        "failed to match webhooks for event"
                    );
                    return;
                }
            }
        };

        if webhooks.is_empty() {
            return;
        }

        tracing::debug!(
            target: TRACING_TARGET,
            event = %event.event,
            base_id = %event.base_id,
            webhook_count = webhooks.len(),
            "dispatching event to webhooks"
        );

        for webhook in webhooks {
            let url = match webhook.url.parse() {
                Ok(url) => url,
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        webhook_id = %webhook.id,
                        url = %webhook.url,
                        error = %err,
                        "skipping webhook with invalid URL"
                    );
                    continue;
                }
            };

            let mut payload = WebhookPayload::new(event.event.to_string(), event.base_id);
            payload.timestamp = event.occurred_at;
            payload.table_id = event.table_id;
            payload.record_id = event.entity_id;
            payload.record = event.record.clone();
            payload.old_record = event.old_record.clone();
            payload.user_id = event.user_id;

            let mut request = WebhookRequest::new(webhook.id, url, payload);
            if let Some(ref secret) = webhook.secret {
                request = request.with_secret(secret.clone());
            }

            // Fire-and-forget: the consume loop never waits on an endpoint.
            let pg_client = self.pg_client.clone();
            let webhook_service = self.webhook_service.clone();
            let event_type = event.event;
            tokio::spawn(async move {
                deliver_and_record(pg_client, webhook_service, event_type, request).await;
            });
        }
    }
}

impl std::fmt::Debug for WebhookWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookWorker").finish_non_exhaustive()
    }
}

/// Delivers one request and records the attempt.
///
/// Also used by the operator test-delivery endpoint, which shares the
/// one-row-per-attempt contract.
pub async fn deliver_and_record(
    pg_client: PgClient,
    webhook_service: WebhookService,
    event_type: gridbase_postgres::types::EventType,
    request: WebhookRequest,
) {
    let payload_snapshot =
        serde_json::to_value(&request.payload).unwrap_or(serde_json::Value::Null);
    let webhook_id = request.webhook_id;

    let started = Instant::now();
    let outcome = webhook_service.deliver(&request).await;
    let duration_ms = started.elapsed().as_millis() as i64;

    let delivery = match outcome {
        Ok(response) => {
            if response.is_success() {
                tracing::info!(
                    target: TRACING_TARGET,
                    webhook_id = %webhook_id,
                    status_code = response.status_code,
                    duration_ms,
                    "webhook delivered"
                );
            } else {
                tracing::warn!(
                    target: TRACING_TARGET,
                    webhook_id = %webhook_id,
                    status_code = response.status_code,
                    duration_ms,
                    "webhook delivery returned non-success status"
                );
            }

            NewWebhookDelivery {
                webhook_id,
                event: event_type,
                payload: payload_snapshot,
                response_status: Some(response.status_code as i32),
                response_body: Some(response.body.clone()),
                error: response.error_message(),
                duration_ms,
            }
        }
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET,
                webhook_id = %webhook_id,
                error = %err,
                duration_ms,
                "webhook delivery failed in transport"
            );

            NewWebhookDelivery {
                webhook_id,
                event: event_type,
                payload: payload_snapshot,
                response_status: None,
                response_body: None,
                error: Some(err.to_string()),
                duration_ms,
            }
        }
    };

    // The delivery row is the audit trail; losing it is log-worthy but
    // must not affect anything upstream.
    match pg_client.get_connection().await {
        Ok(mut conn) => {
            if let Err(err) = conn.record_webhook_delivery(delivery).await {
                tracing::error!(
                    target: TRACING_TARGET,
                    webhook_id = %webhook_id,
                    error = %err,
                    "failed to record webhook delivery"
                );
            }
        }
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET,
                webhook_id = %webhook_id,
                error = %err,
                "failed to acquire connection for delivery record"
            );
        }
    }
}
