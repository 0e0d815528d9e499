//! Request identification and tracing spans.

use axum::Router;
use axum::http::HeaderName;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// The header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Adds request ids and per-request tracing spans to a router.
pub trait RouterObservabilityExt {
    /// Applies the observability stack.
    ///
    /// Incoming requests get a UUID request id (unless the client sent
    /// one), the id is propagated to the response, and every request runs
    /// inside a span that logs its outcome.
    fn with_observability(self) -> Self;
}

impl RouterObservabilityExt for Router {
    fn with_observability(self) -> Self {
        let header = HeaderName::from_static(REQUEST_ID_HEADER);

        self.layer(PropagateRequestIdLayer::new(header.clone()))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(SetRequestIdLayer::new(header, MakeRequestUuid))
    }
}
