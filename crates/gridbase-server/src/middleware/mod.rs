//! Router middleware layers, applied by the entry point.
//!
//! Each concern ships as an extension trait over [`Router`] so the binary
//! composes the stack explicitly: recovery (outermost), observability,
//! security, then routes.
//!
//! [`Router`]: axum::Router

mod observability;
mod recovery;
mod security;

pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{RouterSecurityExt, SecurityConfig};

/// Default request body size limit: 2 MB.
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Body size limit for multipart upload routes: 64 MB.
pub const DEFAULT_MAX_FILE_BODY_SIZE: usize = 64 * 1024 * 1024;
