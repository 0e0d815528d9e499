//! Automation action type enumeration.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The action an automation executes when its trigger matches.
///
/// Corresponds to the `AUTOMATION_ACTION` PostgreSQL enum. Action
/// parameters (templates, target table, URL) live in the automation's
/// `action_config` JSON.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::AutomationAction"]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AutomationActionType {
    /// Sends a templated email through the configured mailer.
    #[db_rename = "send_email"]
    SendEmail,
    /// Creates a record from templated values.
    #[db_rename = "create_record"]
    CreateRecord,
    /// Patches the trigger record (or a selected record) with templated values.
    #[db_rename = "update_record"]
    UpdateRecord,
    /// Delivers a templated HTTP request to an arbitrary URL.
    #[db_rename = "webhook"]
    Webhook,
}
