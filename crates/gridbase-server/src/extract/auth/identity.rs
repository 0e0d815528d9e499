//! The resolved caller identity used by handlers and the mutation service.

use gridbase_postgres::PgConnection;
use gridbase_postgres::query::BaseCollaboratorRepository;
use gridbase_postgres::types::{ApiScope, CollaboratorRole};
use uuid::Uuid;

use crate::TRACING_TARGET_AUTHORIZATION;
use crate::service::{MutationError, MutationResult};

/// How the caller authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessKind {
    /// Interactive session established by login.
    Session {
        /// The session row backing this access.
        session_id: Uuid,
    },
    /// Programmatic access through an API key.
    ApiKey {
        /// The key row backing this access.
        key_id: Uuid,
        /// The key's granted scopes.
        scopes: Vec<ApiScope>,
    },
    /// Internal access by the platform itself (automation actions).
    System,
}

/// A verified caller identity.
///
/// Produced by the [`AuthSession`] extractor for HTTP callers, or by
/// [`Identity::system`] for engine-originated mutations. Role resolution
/// happens per base via [`Identity::require_role`].
///
/// [`AuthSession`]: crate::extract::AuthSession
#[derive(Debug, Clone)]
pub struct Identity {
    /// The authenticated account.
    pub user_id: Uuid,
    /// The account's email address.
    pub email: String,
    /// The account's display name.
    pub display_name: String,
    /// How this identity was established.
    pub access: AccessKind,
    /// Causal depth for automation-originated mutations; zero for users.
    pub causal_depth: u8,
}

impl Identity {
    /// Creates the system identity used by engine-originated mutations.
    ///
    /// The system identity bypasses role checks and journals with no user.
    pub fn system(causal_depth: u8) -> Self {
        Self {
            user_id: Uuid::nil(),
            email: String::new(),
            display_name: "system".to_string(),
            access: AccessKind::System,
            causal_depth,
        }
    }

    /// Returns whether this identity is the internal system actor.
    pub fn is_system(&self) -> bool {
        matches!(self.access, AccessKind::System)
    }

    /// Returns the user id recorded in journal entries and events.
    ///
    /// System mutations journal with no user.
    pub fn journal_user(&self) -> Option<Uuid> {
        if self.is_system() { None } else { Some(self.user_id) }
    }

    /// Returns whether this identity may perform writes at all.
    ///
    /// API keys without the write scope act as viewers everywhere.
    pub fn can_write(&self) -> bool {
        match &self.access {
            AccessKind::ApiKey { scopes, .. } => scopes.contains(&ApiScope::Write),
            AccessKind::Session { .. } | AccessKind::System => true,
        }
    }

    /// Resolves this identity's role on a base and requires at least
    /// `min_role`.
    ///
    /// # Errors
    ///
    /// - [`MutationError::Forbidden`] when the caller is not a collaborator
    ///   or their effective role (role ∩ key scopes) is below `min_role`.
    pub async fn require_role(
        &self,
        conn: &mut PgConnection,
        base_id: Uuid,
        min_role: CollaboratorRole,
    ) -> MutationResult<CollaboratorRole> {
        if self.is_system() {
            return Ok(CollaboratorRole::Owner);
        }

        let Some(role) = conn.find_collaborator_role(base_id, self.user_id).await? else {
            tracing::debug!(
                target: TRACING_TARGET_AUTHORIZATION,
                user_id = %self.user_id,
                base_id = %base_id,
                "caller is not a collaborator"
            );
            return Err(MutationError::Forbidden);
        };

        // An API key without the write scope degrades to viewer.
        let effective = if self.can_write() {
            role
        } else {
            CollaboratorRole::Viewer
        };

        if !effective.has_permission_level_of(min_role) {
            tracing::debug!(
                target: TRACING_TARGET_AUTHORIZATION,
                user_id = %self.user_id,
                base_id = %base_id,
                role = %effective,
                required = %min_role,
                "insufficient role"
            );
            return Err(MutationError::Forbidden);
        }

        Ok(effective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_identity(scopes: Vec<ApiScope>) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "robot@example.com".to_string(),
            display_name: "Robot".to_string(),
            access: AccessKind::ApiKey {
                key_id: Uuid::new_v4(),
                scopes,
            },
            causal_depth: 0,
        }
    }

    #[test]
    fn system_identity_journals_no_user() {
        let identity = Identity::system(2);
        assert!(identity.is_system());
        assert_eq!(identity.journal_user(), None);
        assert_eq!(identity.causal_depth, 2);
    }

    #[test]
    fn read_only_key_cannot_write() {
        assert!(!key_identity(vec![ApiScope::Read]).can_write());
        assert!(key_identity(vec![ApiScope::Read, ApiScope::Write]).can_write());
    }
}
