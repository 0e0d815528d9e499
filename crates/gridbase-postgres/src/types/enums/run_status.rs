//! Automation run status enumeration.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle status of an automation run.
///
/// Corresponds to the `RUN_STATUS` PostgreSQL enum. Run rows are
/// append-only; a run transitions from `running` to exactly one terminal
/// status.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::RunStatus"]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// The action is executing.
    #[db_rename = "running"]
    Running,
    /// The action completed successfully.
    #[db_rename = "success"]
    Success,
    /// The action failed; the error column carries the reason.
    #[db_rename = "failed"]
    Failed,
    /// The trigger matched but preconditions excluded execution.
    #[db_rename = "skipped"]
    Skipped,
}

impl RunStatus {
    /// Returns whether this is a terminal status.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}
