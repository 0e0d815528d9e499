//! CORS, security headers, and body limits.

use axum::Router;
use axum::http::header::{HeaderName, HeaderValue};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use super::DEFAULT_MAX_BODY_SIZE;

/// Configuration for the security stack.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Allowed CORS origin; `None` allows any origin (development).
    pub allowed_origin: Option<String>,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origin: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Adds CORS, security headers, and body limits to a router.
pub trait RouterSecurityExt {
    /// Applies the security stack.
    fn with_security(self, config: SecurityConfig) -> Self;
}

impl RouterSecurityExt for Router {
    fn with_security(self, config: SecurityConfig) -> Self {
        let cors = match config
            .allowed_origin
            .as_deref()
            .and_then(|origin| origin.parse::<HeaderValue>().ok())
        {
            Some(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
            None => CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        };

        self.layer(cors)
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ))
            .layer(RequestBodyLimitLayer::new(config.max_body_size))
    }
}
