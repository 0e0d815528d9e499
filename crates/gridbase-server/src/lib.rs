#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging across auth-related operations

/// Tracing target for authentication operations.
///
/// Used for logging session/API-key verification, account lookup, and other
/// operations that establish caller identity.
pub const TRACING_TARGET_AUTHENTICATION: &str = "gridbase_server::extract::authentication";

/// Tracing target for authorization operations.
///
/// Used for logging role resolution and permission checks against bases.
pub const TRACING_TARGET_AUTHORIZATION: &str = "gridbase_server::extract::authorization";

pub mod extract;
pub mod handler;
pub mod middleware;
pub mod service;
pub mod worker;
