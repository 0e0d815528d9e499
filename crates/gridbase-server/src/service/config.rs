//! Service configuration loaded from flags and environment.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use gridbase_postgres::{PgClient, PgConfig, PgResult};
use gridbase_webhook::WebhookService;
use gridbase_webhook::reqwest::{ReqwestClient, ReqwestConfig};
use serde::{Deserialize, Serialize};

use super::storage::ObjectStore;

/// Lifetime of interactive sessions: 7 days.
pub const SESSION_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Lifetime of password reset tokens: 1 hour.
pub const RESET_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Complete service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ServiceConfig {
    /// Frontend origin used to build password reset links.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "frontend-url",
            env = "FRONTEND_URL",
            default_value = "http://localhost:5173"
        )
    )]
    pub frontend_url: String,

    /// Root directory for the filesystem attachment store.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "storage-root",
            env = "STORAGE_ROOT",
            default_value = "./data/attachments"
        )
    )]
    pub storage_root: String,

    /// Database connection and pool settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(flatten)]
    pub postgres: PgConfig,

    /// Outbound HTTP client settings (webhook delivery).
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(flatten)]
    pub http: ReqwestConfig,
}

impl ServiceConfig {
    /// Connects to Postgres, verifying connectivity.
    pub async fn connect_postgres(&self) -> PgResult<PgClient> {
        self.postgres.validate()?;
        PgClient::new_with_test(self.postgres.clone()).await
    }

    /// Builds the webhook delivery service from the HTTP settings.
    pub fn create_webhook_service(&self) -> WebhookService {
        ReqwestClient::new(self.http.clone()).into_service()
    }

    /// Opens the attachment object store.
    pub fn open_storage(&self) -> gridbase_core::Result<ObjectStore> {
        ObjectStore::filesystem(&self.storage_root)
    }

    /// Builds the password reset link for a raw token.
    pub fn password_reset_link(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.frontend_url.trim_end_matches('/'),
            token
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServiceConfig {
        ServiceConfig {
            frontend_url: "http://localhost:5173/".to_string(),
            storage_root: "./data/attachments".to_string(),
            postgres: PgConfig::new("postgresql://localhost/gridbase"),
            http: ReqwestConfig::default(),
        }
    }

    #[test]
    fn reset_link_avoids_double_slash() {
        let link = config().password_reset_link("tok123");
        assert_eq!(link, "http://localhost:5173/reset-password?token=tok123");
    }

    #[test]
    fn lifetimes_match_policy() {
        assert_eq!(SESSION_LIFETIME, Duration::from_secs(604_800));
        assert_eq!(RESET_TOKEN_LIFETIME, Duration::from_secs(3_600));
    }
}
