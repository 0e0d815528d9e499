//! View type enumeration for saved table presentations.

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The presentation type of a saved view.
///
/// Corresponds to the `VIEW_TYPE` PostgreSQL enum.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::ViewType"]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewType {
    /// Spreadsheet-style grid; the default view created with each table.
    #[db_rename = "grid"]
    #[default]
    Grid,
    /// Cards grouped by a single-select field.
    #[db_rename = "kanban"]
    Kanban,
    /// Records placed on a calendar by a date field.
    #[db_rename = "calendar"]
    Calendar,
    /// Card gallery keyed by an attachment field.
    #[db_rename = "gallery"]
    Gallery,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn default_is_grid() {
        assert_eq!(ViewType::default(), ViewType::Grid);
    }

    #[test]
    fn parses_known_types() {
        assert_eq!(ViewType::from_str("kanban").unwrap(), ViewType::Kanban);
        assert!(ViewType::from_str("timeline").is_err());
    }
}
