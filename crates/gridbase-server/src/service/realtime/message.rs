//! The realtime wire frame exchanged with connected clients.

use gridbase_events::BaseEvent;
use gridbase_postgres::types::EventType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frame types carried over the realtime channel.
///
/// Server-originated types mirror the committed-mutation event types;
/// `presence.*` and `cursor.move` coordinate client sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "record.created")]
    RecordCreated,
    #[serde(rename = "record.updated")]
    RecordUpdated,
    #[serde(rename = "record.deleted")]
    RecordDeleted,
    #[serde(rename = "field.created")]
    FieldCreated,
    #[serde(rename = "field.updated")]
    FieldUpdated,
    #[serde(rename = "field.deleted")]
    FieldDeleted,
    #[serde(rename = "table.created")]
    TableCreated,
    #[serde(rename = "table.updated")]
    TableUpdated,
    #[serde(rename = "table.deleted")]
    TableDeleted,
    #[serde(rename = "view.updated")]
    ViewUpdated,
    #[serde(rename = "base.deleted")]
    BaseDeleted,
    #[serde(rename = "presence.join")]
    PresenceJoin,
    #[serde(rename = "presence.leave")]
    PresenceLeave,
    #[serde(rename = "cursor.move")]
    CursorMove,
}

impl MessageType {
    /// Maps a committed-mutation event type onto its frame type.
    pub fn from_event(event: EventType) -> Option<Self> {
        match event {
            EventType::RecordCreated => Some(Self::RecordCreated),
            EventType::RecordUpdated => Some(Self::RecordUpdated),
            EventType::RecordDeleted => Some(Self::RecordDeleted),
            EventType::FieldCreated => Some(Self::FieldCreated),
            EventType::FieldUpdated => Some(Self::FieldUpdated),
            EventType::FieldDeleted => Some(Self::FieldDeleted),
            EventType::TableCreated => Some(Self::TableCreated),
            EventType::TableUpdated => Some(Self::TableUpdated),
            EventType::TableDeleted => Some(Self::TableDeleted),
            EventType::ViewUpdated => Some(Self::ViewUpdated),
            EventType::BaseDeleted => Some(Self::BaseDeleted),
            EventType::WebhookTest => None,
        }
    }

    /// Returns whether clients may originate this frame type.
    pub fn is_client_origin(self) -> bool {
        matches!(self, Self::CursorMove)
    }
}

/// A realtime frame.
///
/// Record events carry the affected record in `record_id`; for field,
/// table, and view events the entity id travels inside `payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeMessage {
    /// The frame type.
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// The base this frame belongs to.
    pub base_id: Uuid,
    /// The affected table, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<Uuid>,
    /// The affected record, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    /// The originating user; `None` for system frames.
    pub user_id: Option<Uuid>,
    /// Frame-type-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl RealtimeMessage {
    /// Builds the broadcast frame for a committed-mutation event.
    ///
    /// Returns `None` for event types that have no realtime frame.
    pub fn from_event(event: &BaseEvent) -> Option<Self> {
        let message_type = MessageType::from_event(event.event)?;

        let record_id = match message_type {
            MessageType::RecordCreated
            | MessageType::RecordUpdated
            | MessageType::RecordDeleted => event.entity_id,
            _ => None,
        };

        let mut payload = serde_json::Map::new();
        if let Some(ref record) = event.record {
            if let Some(entries) = record.as_object() {
                payload.extend(entries.clone());
            }
        }
        if let Some(ref old_record) = event.old_record {
            payload.insert("old_record".to_string(), old_record.clone());
        }
        if record_id.is_none()
            && let Some(entity_id) = event.entity_id
        {
            payload.insert("id".to_string(), serde_json::json!(entity_id));
        }

        Some(Self {
            message_type,
            base_id: event.base_id,
            table_id: event.table_id,
            record_id,
            user_id: event.user_id,
            payload: serde_json::Value::Object(payload),
        })
    }

    /// Builds a presence frame for a joining or leaving connection.
    pub fn presence(
        joined: bool,
        base_id: Uuid,
        user_id: Uuid,
        display_name: &str,
    ) -> Self {
        Self {
            message_type: if joined {
                MessageType::PresenceJoin
            } else {
                MessageType::PresenceLeave
            },
            base_id,
            table_id: None,
            record_id: None,
            user_id: Some(user_id),
            payload: serde_json::json!({ "display_name": display_name }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_shape_for_record_update() {
        let base_id = Uuid::new_v4();
        let table_id = Uuid::new_v4();
        let record_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let event = BaseEvent::new(EventType::RecordUpdated, base_id)
            .with_table(table_id)
            .with_entity(record_id)
            .with_user(user_id)
            .with_record(serde_json::json!({"values": {"f1": 42}}))
            .with_old_record(serde_json::json!({"values": {"f1": 1}}));

        let frame = RealtimeMessage::from_event(&event).unwrap();
        let json = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["type"], "record.updated");
        assert_eq!(json["base_id"], serde_json::json!(base_id));
        assert_eq!(json["table_id"], serde_json::json!(table_id));
        assert_eq!(json["record_id"], serde_json::json!(record_id));
        assert_eq!(json["user_id"], serde_json::json!(user_id));
        assert_eq!(json["payload"]["values"]["f1"], 42);
        assert_eq!(json["payload"]["old_record"]["values"]["f1"], 1);
    }

    #[test]
    fn field_events_carry_entity_in_payload() {
        let field_id = Uuid::new_v4();
        let event = BaseEvent::new(EventType::FieldDeleted, Uuid::new_v4())
            .with_table(Uuid::new_v4())
            .with_entity(field_id);

        let frame = RealtimeMessage::from_event(&event).unwrap();
        assert_eq!(frame.record_id, None);
        assert_eq!(frame.payload["id"], serde_json::json!(field_id));
    }

    #[test]
    fn webhook_test_has_no_frame() {
        let event = BaseEvent::new(EventType::WebhookTest, Uuid::new_v4());
        assert!(RealtimeMessage::from_event(&event).is_none());
    }

    #[test]
    fn presence_round_trip() {
        let base_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let frame = RealtimeMessage::presence(true, base_id, user_id, "Ana");

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "presence.join");
        assert_eq!(json["payload"]["display_name"], "Ana");

        let back: RealtimeMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back.message_type, MessageType::PresenceJoin);
    }

    #[test]
    fn cursor_is_the_only_client_origin_type() {
        assert!(MessageType::CursorMove.is_client_origin());
        assert!(!MessageType::RecordUpdated.is_client_origin());
        assert!(!MessageType::PresenceJoin.is_client_origin());
    }
}
