//! API key scope enumeration.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A capability granted to an API key.
///
/// Corresponds to the `API_SCOPE` PostgreSQL enum. An API key inherits the
/// owner's role on bases the owner can access, intersected with its scopes:
/// a key without [`ApiScope::Write`] acts as a viewer everywhere.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::ApiScope"]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApiScope {
    /// Read access to data the key owner can see.
    #[db_rename = "read"]
    Read,
    /// Write access up to the key owner's role.
    #[db_rename = "write"]
    Write,
}
