//! Outbound mail behind a pluggable provider trait.
//!
//! Password reset links and `send_email` automations go through the same
//! [`Mailer`]. The default provider writes the rendered message to the log;
//! SMTP or an API-backed sender is a deployment adapter implementing the
//! same trait.

use std::sync::Arc;

use gridbase_core::Result;

/// Tracing target for mail operations.
const TRACING_TARGET: &str = "gridbase_server::service::mailer";

/// An outbound email message.
#[derive(Debug, Clone)]
pub struct MailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Core trait for outbound mail providers.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message.
    async fn send(&self, message: &MailMessage) -> Result<()>;
}

/// Provider that logs messages instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMailer;

#[async_trait::async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        tracing::info!(
            target: TRACING_TARGET,
            to = %message.to,
            subject = %message.subject,
            body_len = message.body.len(),
            "outbound mail (logging provider)"
        );
        Ok(())
    }
}

/// Type-erased handle to a [`Mailer`] implementation.
#[derive(Clone)]
pub struct MailerService {
    provider: Arc<dyn Mailer>,
}

impl MailerService {
    /// Wraps a provider into a service handle.
    pub fn new(provider: impl Mailer + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Sends one message.
    pub async fn send(&self, message: &MailMessage) -> Result<()> {
        self.provider.send(message).await
    }
}

impl Default for MailerService {
    fn default() -> Self {
        Self::new(TracingMailer)
    }
}

impl std::fmt::Debug for MailerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracing_mailer_accepts_messages() {
        let mailer = MailerService::default();
        let message = MailMessage {
            to: "user@example.com".to_string(),
            subject: "Reset your password".to_string(),
            body: "http://localhost:5173/reset?token=...".to_string(),
        };

        assert!(mailer.send(&message).await.is_ok());
    }
}
