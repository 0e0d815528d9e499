//! Database query repositories for all entities in the system.
//!
//! This module contains repository implementations that provide high-level
//! database operations for all entities, encapsulating common patterns and
//! providing type-safe interfaces. Repositories are traits implemented
//! directly on the async connection, so any [`PgConn`] can compose them.
//!
//! # Pagination
//!
//! All queries that may return large result sets use the [`Pagination`]
//! struct to provide consistent, bounded pagination across the system.
//!
//! [`PgConn`]: crate::PgConn

pub mod activity;
pub mod api_key;
pub mod attachment;
pub mod automation;
pub mod automation_run;
pub mod base;
pub mod base_collaborator;
pub mod comment;
pub mod field;
pub mod form;
pub mod password_reset_token;
pub mod record;
pub mod session;
pub mod table;
pub mod user;
pub mod view;
pub mod webhook;
pub mod webhook_delivery;

pub use activity::ActivityRepository;
pub use api_key::ApiKeyRepository;
pub use attachment::AttachmentRepository;
pub use automation::AutomationRepository;
pub use automation_run::AutomationRunRepository;
pub use base::BaseRepository;
pub use base_collaborator::BaseCollaboratorRepository;
pub use comment::CommentRepository;
pub use field::FieldRepository;
pub use form::FormRepository;
pub use password_reset_token::PasswordResetTokenRepository;
pub use record::RecordRepository;
use serde::{Deserialize, Serialize};
pub use session::SessionRepository;
pub use table::TableRepository;
pub use user::UserRepository;
pub use view::ViewRepository;
pub use webhook::WebhookRepository;
pub use webhook_delivery::WebhookDeliveryRepository;

diesel::define_sql_function! {
    /// Lower-cases text for case-insensitive comparisons.
    fn lower(text: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

/// Pagination parameters for database queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of records to return.
    pub limit: i64,
    /// Number of records to skip.
    pub offset: i64,
}

impl Pagination {
    /// Creates a new pagination instance.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            // Ensure limit is between 1 and 1000
            limit: limit.clamp(1, 1000),
            // Ensure offset is non-negative
            offset: offset.max(0),
        }
    }

    /// Creates pagination from page number and page size.
    pub fn from_page(page: i64, page_size: i64) -> Self {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 1000);
        Self::new(page_size, (page - 1) * page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(50, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_new() {
        let pagination = Pagination::new(25, 100);
        assert_eq!(pagination.limit, 25);
        assert_eq!(pagination.offset, 100);
    }

    #[test]
    fn pagination_bounds_checking() {
        let pagination = Pagination::new(0, 10);
        assert_eq!(pagination.limit, 1);

        let pagination = Pagination::new(1500, 10);
        assert_eq!(pagination.limit, 1000);

        let pagination = Pagination::new(10, -5);
        assert_eq!(pagination.offset, 0);
    }

    #[test]
    fn pagination_from_page() {
        let pagination = Pagination::from_page(3, 20);
        assert_eq!(pagination.limit, 20);
        assert_eq!(pagination.offset, 40);
    }
}
