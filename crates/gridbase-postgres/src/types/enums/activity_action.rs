//! Activity action enumeration for the append-only journal.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The action recorded by an activity journal entry.
///
/// Corresponds to the `ACTIVITY_ACTION` PostgreSQL enum.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::ActivityAction"]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityAction {
    /// An entity was created.
    #[db_rename = "create"]
    Create,
    /// An entity was updated.
    #[db_rename = "update"]
    Update,
    /// An entity was deleted.
    #[db_rename = "delete"]
    Delete,
}
