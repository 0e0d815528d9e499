//! Collaborator role enumeration for base-level access control.

use std::cmp;

use diesel_derive_enum::DbEnum;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Defines the role and permission level of a base collaborator.
///
/// This enumeration corresponds to the `COLLABORATOR_ROLE` PostgreSQL enum
/// and provides hierarchical access control. Every base has exactly one
/// owner; the owner row can be neither role-changed nor removed.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::CollaboratorRole"]
pub enum CollaboratorRole {
    /// Full control: collaborator management, base deletion, view publishing.
    #[db_rename = "owner"]
    #[serde(rename = "owner")]
    #[strum(serialize = "owner")]
    Owner,

    /// Can mutate content and schema, but not collaborators or the base itself.
    #[db_rename = "editor"]
    #[serde(rename = "editor")]
    #[strum(serialize = "editor")]
    Editor,

    /// Read-only access to base content.
    #[db_rename = "viewer"]
    #[serde(rename = "viewer")]
    #[strum(serialize = "viewer")]
    #[default]
    Viewer,
}

impl CollaboratorRole {
    /// Returns the hierarchical level of this role (higher number = more permissions).
    #[inline]
    pub const fn hierarchy_level(self) -> u8 {
        match self {
            CollaboratorRole::Viewer => 1,
            CollaboratorRole::Editor => 2,
            CollaboratorRole::Owner => 3,
        }
    }

    /// Returns whether this role has equal or higher permissions than the other role.
    #[inline]
    pub const fn has_permission_level_of(self, other: CollaboratorRole) -> bool {
        self.hierarchy_level() >= other.hierarchy_level()
    }

    /// Returns whether this role may mutate base content.
    #[inline]
    pub fn can_edit(self) -> bool {
        self.has_permission_level_of(CollaboratorRole::Editor)
    }

    /// Returns whether this role owns the base.
    #[inline]
    pub fn is_owner(self) -> bool {
        matches!(self, CollaboratorRole::Owner)
    }
}

impl PartialOrd for CollaboratorRole {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CollaboratorRole {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.hierarchy_level().cmp(&other.hierarchy_level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_hierarchy() {
        assert!(CollaboratorRole::Owner > CollaboratorRole::Editor);
        assert!(CollaboratorRole::Editor > CollaboratorRole::Viewer);
    }

    #[test]
    fn editor_can_edit_but_does_not_own() {
        assert!(CollaboratorRole::Editor.can_edit());
        assert!(!CollaboratorRole::Editor.is_owner());
        assert!(!CollaboratorRole::Viewer.can_edit());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&CollaboratorRole::Owner).unwrap();
        assert_eq!(json, "\"owner\"");
    }
}
