//! Service layer: the mutation choke point, realtime hub, and supporting
//! services behind the handlers and workers.

pub mod auth;
pub mod automation;
pub mod compute;
pub mod csv;
mod config;
mod mailer;
mod mutation;
pub mod realtime;
mod state;
mod storage;

pub use auth::{AuthHasher, GeneratedApiKey, GeneratedToken, PasswordStrength};
pub use config::{RESET_TOKEN_LIFETIME, SESSION_LIFETIME, ServiceConfig};
pub use mailer::{MailMessage, Mailer, MailerService, TracingMailer};
pub use mutation::{
    InvalidInput, MAX_CAUSAL_DEPTH, MutationError, MutationResult, MutationService,
};
pub use realtime::RealtimeHub;
pub use state::ServiceState;
pub use storage::ObjectStore;
