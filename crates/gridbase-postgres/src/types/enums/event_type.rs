//! Event type enumeration shared by the event bus, realtime fan-out,
//! and webhook subscriptions.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::EntityKind;

/// The type of a committed-mutation event.
///
/// Corresponds to the `EVENT_TYPE` PostgreSQL enum. Webhooks store an array
/// of these to express their subscription set; realtime frames carry the
/// same dotted names in their `type` field.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::EventType"]
pub enum EventType {
    #[db_rename = "record.created"]
    #[serde(rename = "record.created")]
    #[strum(serialize = "record.created")]
    RecordCreated,
    #[db_rename = "record.updated"]
    #[serde(rename = "record.updated")]
    #[strum(serialize = "record.updated")]
    RecordUpdated,
    #[db_rename = "record.deleted"]
    #[serde(rename = "record.deleted")]
    #[strum(serialize = "record.deleted")]
    RecordDeleted,
    #[db_rename = "field.created"]
    #[serde(rename = "field.created")]
    #[strum(serialize = "field.created")]
    FieldCreated,
    #[db_rename = "field.updated"]
    #[serde(rename = "field.updated")]
    #[strum(serialize = "field.updated")]
    FieldUpdated,
    #[db_rename = "field.deleted"]
    #[serde(rename = "field.deleted")]
    #[strum(serialize = "field.deleted")]
    FieldDeleted,
    #[db_rename = "table.created"]
    #[serde(rename = "table.created")]
    #[strum(serialize = "table.created")]
    TableCreated,
    #[db_rename = "table.updated"]
    #[serde(rename = "table.updated")]
    #[strum(serialize = "table.updated")]
    TableUpdated,
    #[db_rename = "table.deleted"]
    #[serde(rename = "table.deleted")]
    #[strum(serialize = "table.deleted")]
    TableDeleted,
    #[db_rename = "view.updated"]
    #[serde(rename = "view.updated")]
    #[strum(serialize = "view.updated")]
    ViewUpdated,
    /// Emitted once when a base and its whole subtree are deleted.
    #[db_rename = "base.deleted"]
    #[serde(rename = "base.deleted")]
    #[strum(serialize = "base.deleted")]
    BaseDeleted,
    /// Synthetic event used by operator-initiated test deliveries; never
    /// produced by the mutation path.
    #[db_rename = "webhook.test"]
    #[serde(rename = "webhook.test")]
    #[strum(serialize = "webhook.test")]
    WebhookTest,
}

impl EventType {
    /// Returns the kind of entity this event refers to.
    pub const fn entity_kind(self) -> EntityKind {
        match self {
            Self::RecordCreated | Self::RecordUpdated | Self::RecordDeleted => EntityKind::Record,
            Self::FieldCreated | Self::FieldUpdated | Self::FieldDeleted => EntityKind::Field,
            Self::TableCreated | Self::TableUpdated | Self::TableDeleted => EntityKind::Table,
            Self::ViewUpdated => EntityKind::View,
            Self::BaseDeleted => EntityKind::Base,
            Self::WebhookTest => EntityKind::Webhook,
        }
    }

    /// Returns whether webhooks may subscribe to this event type.
    pub const fn is_subscribable(self) -> bool {
        !matches!(self, Self::WebhookTest)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn dotted_names_round_trip() {
        let parsed = EventType::from_str("record.updated").unwrap();
        assert_eq!(parsed, EventType::RecordUpdated);
        assert_eq!(parsed.to_string(), "record.updated");
    }

    #[test]
    fn serde_uses_dotted_names() {
        let json = serde_json::to_string(&EventType::BaseDeleted).unwrap();
        assert_eq!(json, "\"base.deleted\"");

        let back: EventType = serde_json::from_str("\"field.created\"").unwrap();
        assert_eq!(back, EventType::FieldCreated);
    }

    #[test]
    fn entity_kinds() {
        assert_eq!(EventType::RecordCreated.entity_kind(), EntityKind::Record);
        assert_eq!(EventType::BaseDeleted.entity_kind(), EntityKind::Base);
    }

    #[test]
    fn test_event_is_not_subscribable() {
        assert!(!EventType::WebhookTest.is_subscribable());
        assert!(EventType::RecordCreated.is_subscribable());
    }
}
