//! Application state and dependency injection.

use gridbase_events::EventBus;
use gridbase_postgres::PgClient;
use gridbase_webhook::WebhookService;

use super::auth::{AuthHasher, PasswordStrength};
use super::config::ServiceConfig;
use super::mailer::MailerService;
use super::mutation::MutationService;
use super::realtime::RealtimeHub;
use super::storage::ObjectStore;

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection). The event bus,
/// realtime hub, and connection pool are process-wide singletons: they are
/// constructed here once at startup and shut down from the entry point.
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    pg_client: PgClient,
    event_bus: EventBus,
    realtime_hub: RealtimeHub,
    mutations: MutationService,
    webhook_service: WebhookService,
    mailer: MailerService,
    storage: ObjectStore,

    auth_hasher: AuthHasher,
    password_strength: PasswordStrength,
    config: ServiceConfig,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to all external services and wires the in-process
    /// singletons together.
    pub async fn from_config(config: ServiceConfig) -> anyhow::Result<Self> {
        let pg_client = config.connect_postgres().await?;
        let event_bus = EventBus::new();
        let realtime_hub = RealtimeHub::new(event_bus.clone());
        let mutations = MutationService::new(pg_client.clone(), event_bus.clone());
        let webhook_service = config.create_webhook_service();
        let storage = config.open_storage()?;

        Ok(Self {
            pg_client,
            event_bus,
            realtime_hub,
            mutations,
            webhook_service,
            mailer: MailerService::default(),
            storage,
            auth_hasher: AuthHasher::new(),
            password_strength: PasswordStrength::new(),
            config,
        })
    }

    /// Replaces the mail provider (SMTP adapter, test capture).
    pub fn with_mailer(mut self, mailer: MailerService) -> Self {
        self.mailer = mailer;
        self
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+ $(,)?) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(pg_client: PgClient);
impl_di!(event_bus: EventBus);
impl_di!(realtime_hub: RealtimeHub);
impl_di!(mutations: MutationService);
impl_di!(webhook_service: WebhookService);
impl_di!(mailer: MailerService);
impl_di!(storage: ObjectStore);

impl_di!(auth_hasher: AuthHasher);
impl_di!(password_strength: PasswordStrength);
impl_di!(config: ServiceConfig);
