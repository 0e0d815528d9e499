#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::FromRef;
use clap::Parser;
use gridbase_postgres::{PgClient, PgClientExt};
use gridbase_server::handler::routes;
use gridbase_server::middleware::{
    RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt, SecurityConfig,
};
use gridbase_server::service::{MailerService, MutationService, RealtimeHub, ServiceState};
use gridbase_server::worker::{AutomationWorker, WebhookWorker};
use gridbase_events::EventBus;
use gridbase_webhook::WebhookService;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Cli, log_server_config};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "gridbase_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "gridbase_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "gridbase_cli::config";

/// Bounded wait for workers to finish after cancellation.
const WORKER_DRAIN: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();
    log_startup_info();
    log_server_config(&cli.server);

    let state = ServiceState::from_config(cli.service)
        .await
        .context("failed to create service state")?;

    // Schema first: the embedded migrations are idempotent.
    let pg_client = PgClient::from_ref(&state);
    let migration = pg_client
        .run_pending_migrations()
        .await
        .context("failed to run database migrations")?;
    if migration.applied_any() {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            applied = migration.applied.len(),
            "database migrations applied"
        );
    }

    let shutdown = CancellationToken::new();
    let workers = spawn_workers(&state, &shutdown);

    let router = create_router(state.clone());
    server::serve(router, cli.server, shutdown.clone()).await?;

    // The listener has drained; stop fan-out and close shared resources.
    shutdown.cancel();
    RealtimeHub::from_ref(&state).shutdown();

    for worker in workers {
        if tokio::time::timeout(WORKER_DRAIN, worker).await.is_err() {
            tracing::warn!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                "worker did not stop within the drain deadline"
            );
        }
    }

    pg_client.close();

    Ok(())
}

/// Starts the webhook and automation workers.
fn spawn_workers(
    state: &ServiceState,
    shutdown: &CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>> {
    let pg_client = PgClient::from_ref(state);
    let bus = EventBus::from_ref(state);
    let webhook_service = WebhookService::from_ref(state);
    let mutations = MutationService::from_ref(state);
    let mailer = MailerService::from_ref(state);

    let webhook_worker =
        WebhookWorker::new(pg_client.clone(), bus.clone(), webhook_service);
    let webhook_cancel = shutdown.clone();
    let webhook_handle = tokio::spawn(async move {
        webhook_worker.run(webhook_cancel).await;
    });

    let automation_worker = AutomationWorker::new(pg_client, bus, mutations, mailer);
    let automation_cancel = shutdown.clone();
    let automation_handle = tokio::spawn(async move {
        automation_worker.run(automation_cancel).await;
    });

    vec![webhook_handle, automation_handle]
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// recovery catches panics and enforces deadlines, observability stamps
/// request ids and spans, security adds CORS/headers/limits, and the
/// client-IP source feeds session bookkeeping.
fn create_router(state: ServiceState) -> Router {
    routes(state)
        .layer(axum_client_ip::ClientIpSource::ConnectInfo.into_extension())
        .with_security(SecurityConfig::default())
        .with_observability()
        .with_recovery(RecoveryConfig::default())
}

/// Initializes the tracing subscriber from `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gridbase=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Logs build information at startup.
fn log_startup_info() {
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting gridbase server"
    );
}
