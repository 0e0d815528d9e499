//! Command-line and environment configuration.

use clap::{Args, Parser};
use gridbase_server::service::ServiceConfig;

/// The Gridbase server.
#[derive(Debug, Parser)]
#[command(name = "gridbase", version, about)]
pub struct Cli {
    /// HTTP listener settings.
    #[command(flatten)]
    pub server: ServerConfig,

    /// Application service settings.
    #[command(flatten)]
    pub service: ServiceConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind the listener to.
    #[arg(long = "host", env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the listener to.
    #[arg(long = "port", env = "PORT", default_value = "8080")]
    pub port: u16,
}

impl ServerConfig {
    /// Resolves the socket address to bind.
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address `{addr}`: {e}"))
    }
}

/// Logs the effective server configuration at startup.
pub fn log_server_config(config: &ServerConfig) {
    tracing::info!(
        target: crate::TRACING_TARGET_CONFIG,
        host = %config.host,
        port = config.port,
        "server configuration loaded"
    );
}
