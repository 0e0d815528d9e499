//! Enhanced HTTP request extractors with improved error handling.
//!
//! Custom Axum extractors that replace their standard counterparts with
//! taxonomy-aware rejections: every extraction failure surfaces as the
//! stable-code error envelope instead of axum's plain-text defaults.

mod auth;
mod connection_info;
mod pg_connection;
mod reject;

pub use crate::extract::auth::{
    AccessKind, AuthSession, Identity, resolve_api_key, resolve_session_token, token_digest,
};
pub use crate::extract::connection_info::{BearerToken, ClientMeta};
pub use crate::extract::pg_connection::PgPool;
pub use crate::extract::reject::{Json, Path, Query, ValidateJson};
