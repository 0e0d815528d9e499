//! The logical event emitted for every committed mutation.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EventType;

/// An in-memory value describing one committed mutation.
///
/// Produced by the mutation path after its transaction commits and
/// distributed by the [`EventBus`]. For record updates, `old_record`
/// carries the previous cell values so automations and webhook consumers
/// can diff without re-reading the database.
///
/// [`EventBus`]: crate::EventBus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseEvent {
    /// The event type.
    pub event: EventType,
    /// The base where the mutation occurred.
    pub base_id: Uuid,
    /// The affected table, when applicable.
    pub table_id: Option<Uuid>,
    /// The affected entity (record, field, view, ...), when applicable.
    pub entity_id: Option<Uuid>,
    /// The acting user; `None` for system-originated mutations.
    pub user_id: Option<Uuid>,
    /// Snapshot of the new entity state.
    pub record: Option<serde_json::Value>,
    /// Previous record values; present only for record updates.
    pub old_record: Option<serde_json::Value>,
    /// Causal depth for automation-produced events; bounds cascades.
    pub causal_depth: u8,
    /// Timestamp when the mutation committed.
    pub occurred_at: Timestamp,
}

impl BaseEvent {
    /// Creates a new event for a base.
    pub fn new(event: EventType, base_id: Uuid) -> Self {
        Self {
            event,
            base_id,
            table_id: None,
            entity_id: None,
            user_id: None,
            record: None,
            old_record: None,
            causal_depth: 0,
            occurred_at: Timestamp::now(),
        }
    }

    /// Sets the affected table.
    pub fn with_table(mut self, table_id: Uuid) -> Self {
        self.table_id = Some(table_id);
        self
    }

    /// Sets the affected entity.
    pub fn with_entity(mut self, entity_id: Uuid) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Sets the acting user.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attaches a snapshot of the new entity state.
    pub fn with_record(mut self, record: serde_json::Value) -> Self {
        self.record = Some(record);
        self
    }

    /// Attaches the previous record values (record updates only).
    pub fn with_old_record(mut self, old_record: serde_json::Value) -> Self {
        self.old_record = Some(old_record);
        self
    }

    /// Sets the causal depth for automation-produced events.
    pub fn with_causal_depth(mut self, depth: u8) -> Self {
        self.causal_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let base_id = Uuid::new_v4();
        let table_id = Uuid::new_v4();
        let record_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let event = BaseEvent::new(EventType::RecordUpdated, base_id)
            .with_table(table_id)
            .with_entity(record_id)
            .with_user(user_id)
            .with_record(serde_json::json!({"values": {}}))
            .with_old_record(serde_json::json!({"values": {"a": 1}}));

        assert_eq!(event.event, EventType::RecordUpdated);
        assert_eq!(event.base_id, base_id);
        assert_eq!(event.table_id, Some(table_id));
        assert_eq!(event.entity_id, Some(record_id));
        assert_eq!(event.user_id, Some(user_id));
        assert!(event.record.is_some());
        assert!(event.old_record.is_some());
        assert_eq!(event.causal_depth, 0);
    }

    #[test]
    fn serializes_with_dotted_event_name() {
        let event = BaseEvent::new(EventType::RecordCreated, Uuid::new_v4());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "record.created");
    }
}
