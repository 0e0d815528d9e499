//! Authentication extractors and caller identity.

mod auth_session;
mod identity;

pub use auth_session::{
    AuthSession, resolve_api_key, resolve_session_token, token_digest,
};
pub use identity::{AccessKind, Identity};
