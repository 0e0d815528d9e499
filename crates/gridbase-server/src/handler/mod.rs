//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! Handlers are thin: they extract, authorize reads, and delegate writes to
//! the mutation service. Every route is registered through [`routes`],
//! which the entry point wraps with the middleware stack.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod activities;
mod api_keys;
mod attachments;
mod auth;
mod automations;
mod bases;
mod comments;
mod error;
mod fields;
mod forms;
mod import_export;
mod monitors;
mod public;
mod records;
pub mod request;
pub mod response;
mod tables;
mod views;
mod webhooks;
pub mod websocket;

use aide::axum::ApiRouter;
use aide::openapi::OpenApi;
use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

#[inline]
async fn fallback_handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns the complete application router.
///
/// The websocket upgrade route is registered outside the documented API
/// surface; everything else carries OpenAPI operation docs.
pub fn routes(state: ServiceState) -> Router {
    let mut api = OpenApi::default();

    let api_router = ApiRouter::new()
        .merge(auth::routes())
        .merge(bases::routes())
        .merge(tables::routes())
        .merge(fields::routes())
        .merge(records::routes())
        .merge(views::routes())
        .merge(forms::routes())
        .merge(public::routes())
        .merge(comments::routes())
        .merge(attachments::routes())
        .merge(activities::routes())
        .merge(webhooks::routes())
        .merge(api_keys::routes())
        .merge(automations::routes())
        .merge(import_export::routes())
        .merge(monitors::routes());

    api_router
        .finish_api(&mut api)
        .merge(websocket::routes())
        .fallback(fallback_handler)
        .with_state(state)
}
