//! HTTP serving and graceful shutdown.

use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Grace period for in-flight requests on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Serves the router until a termination signal arrives.
///
/// On SIGINT/SIGTERM the cancellation token fires first (stopping the
/// workers and draining the hub), then the listener shuts down gracefully
/// with a bounded deadline for in-flight requests.
pub async fn serve(
    router: Router,
    config: ServerConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let handle = Handle::new();

    tokio::spawn(wait_for_signal(handle.clone(), shutdown));

    tracing::info!(
        target: crate::TRACING_TARGET_SERVER_STARTUP,
        addr = %addr,
        "listening"
    );

    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service_with_connect_info::<std::net::SocketAddr>())
        .await?;

    Ok(())
}

/// Waits for SIGINT or SIGTERM, then initiates the drain.
async fn wait_for_signal(handle: Handle, shutdown: CancellationToken) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(
                    target: crate::TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %err,
                    "failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!(
        target: crate::TRACING_TARGET_SERVER_SHUTDOWN,
        "termination signal received, draining"
    );

    // Workers and the hub stop first so no new fan-out starts while the
    // listener drains.
    shutdown.cancel();
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
