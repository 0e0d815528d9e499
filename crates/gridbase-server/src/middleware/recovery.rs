//! Panic recovery and request deadlines.

use std::time::Duration;

use axum::Router;
use axum::response::IntoResponse;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handler::ErrorKind;

/// Configuration for the recovery stack.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryConfig {
    /// Hard deadline for one request.
    pub request_timeout: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            // Above the 30 s outbound-call budget so proxied failures
            // surface as their own errors, not as gateway timeouts.
            request_timeout: Duration::from_secs(40),
        }
    }
}

/// Adds panic catching and request timeouts to a router.
pub trait RouterRecoveryExt {
    /// Applies the recovery stack.
    fn with_recovery(self, config: RecoveryConfig) -> Self;
}

impl RouterRecoveryExt for Router {
    fn with_recovery(self, config: RecoveryConfig) -> Self {
        self.layer(CatchPanicLayer::custom(handle_panic))
            .layer(TimeoutLayer::new(config.request_timeout))
    }
}

/// Converts a handler panic into the stable-code envelope.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    let detail = if let Some(text) = err.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = err.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "handler panicked");

    ErrorKind::InternalServerError.into_response()
}
