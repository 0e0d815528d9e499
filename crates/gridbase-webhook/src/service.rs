//! Provider-erased webhook delivery service.

use std::sync::Arc;

use crate::{Result, ServiceHealth, WebhookProvider, WebhookRequest, WebhookResponse};

/// Type-erased handle to a [`WebhookProvider`] implementation.
///
/// Used for dependency injection: the server holds a `WebhookService` and
/// stays independent of the concrete HTTP client behind it.
#[derive(Clone)]
pub struct WebhookService {
    provider: Arc<dyn WebhookProvider>,
}

impl WebhookService {
    /// Wraps a provider into a service handle.
    pub fn new(provider: impl WebhookProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Delivers a webhook payload to its endpoint.
    pub async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
        self.provider.deliver(request).await
    }

    /// Performs a health check on the underlying provider.
    pub async fn health_check(&self) -> Result<ServiceHealth> {
        self.provider.health_check().await
    }
}

impl std::fmt::Debug for WebhookService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookService").finish_non_exhaustive()
    }
}
