//! Automation trigger type enumeration.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The condition under which an automation fires.
///
/// Corresponds to the `AUTOMATION_TRIGGER` PostgreSQL enum. Trigger
/// parameters (watched field, match operator and value) live in the
/// automation's `trigger_config` JSON.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::AutomationTrigger"]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AutomationTriggerType {
    /// Fires once per new record in the automation's table.
    #[db_rename = "record_created"]
    RecordCreated,
    /// Fires when a record changes; optionally scoped to one watched field.
    #[db_rename = "record_updated"]
    RecordUpdated,
    /// Fires when a record's field value satisfies an operator after a change.
    #[db_rename = "record_matches"]
    RecordMatches,
}
