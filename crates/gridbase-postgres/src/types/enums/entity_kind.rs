//! Entity kind enumeration for journal entries.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The kind of entity an activity journal entry refers to.
///
/// Corresponds to the `ENTITY_KIND` PostgreSQL enum.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::EntityKind"]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    #[db_rename = "base"]
    Base,
    #[db_rename = "table"]
    Table,
    #[db_rename = "field"]
    Field,
    #[db_rename = "record"]
    Record,
    #[db_rename = "view"]
    View,
    #[db_rename = "form"]
    Form,
    #[db_rename = "comment"]
    Comment,
    #[db_rename = "attachment"]
    Attachment,
    #[db_rename = "webhook"]
    Webhook,
    #[db_rename = "automation"]
    Automation,
    #[db_rename = "collaborator"]
    Collaborator,
}
