//! Webhook model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::webhooks;
use crate::types::EventType;

/// An outbound HTTP subscriber registered on a base.
///
/// Delivery happens only while the webhook is active and the event type is
/// in its subscription set.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = webhooks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Webhook {
    /// Unique webhook identifier.
    pub id: Uuid,
    /// The base this webhook observes.
    pub base_id: Uuid,
    /// Human-readable name for the webhook.
    pub display_name: String,
    /// Webhook endpoint URL.
    pub url: String,
    /// Event types this webhook subscribes to.
    pub events: Vec<Option<EventType>>,
    /// Shared secret for signature verification.
    pub secret: Option<String>,
    /// Whether the webhook receives deliveries.
    pub is_active: bool,
    /// Timestamp when the webhook was created.
    pub created_at: Timestamp,
    /// Timestamp when the webhook was last modified.
    pub updated_at: Timestamp,
}

impl Webhook {
    /// Returns whether this webhook subscribes to the given event type.
    pub fn subscribes_to(&self, event: EventType) -> bool {
        self.events.iter().flatten().any(|e| *e == event)
    }
}

/// Data for creating a new webhook.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = webhooks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWebhook {
    /// The base this webhook observes.
    pub base_id: Uuid,
    /// Webhook name.
    pub display_name: String,
    /// Endpoint URL.
    pub url: String,
    /// Subscribed event types.
    pub events: Vec<Option<EventType>>,
    /// Optional signing secret.
    pub secret: Option<String>,
    /// Whether the webhook starts active.
    pub is_active: bool,
}

/// Data for updating a webhook.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = webhooks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateWebhook {
    /// New webhook name.
    pub display_name: Option<String>,
    /// New endpoint URL.
    pub url: Option<String>,
    /// New subscription set.
    pub events: Option<Vec<Option<EventType>>>,
    /// New signing secret.
    pub secret: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}
