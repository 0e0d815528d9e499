//! Health monitoring routes for deployment probes.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use gridbase_core::{ServiceHealth, ServiceStatus};
use gridbase_postgres::PgClient;
use schemars::JsonSchema;
use serde::Serialize;

use crate::extract::Json;
use crate::handler::Result;
use crate::service::{RealtimeHub, ServiceState};

/// Aggregate process health.
#[derive(Debug, Serialize, JsonSchema)]
struct HealthReport {
    /// Overall status.
    #[schemars(with = "String")]
    status: ServiceStatus,
    /// Connection pool utilization (0.0 - 1.0).
    pool_utilization: f64,
    /// Live realtime connections.
    realtime_connections: usize,
}

/// Reports process and dependency health.
async fn health(
    State(pg_client): State<PgClient>,
    State(hub): State<RealtimeHub>,
) -> Result<(StatusCode, Json<HealthReport>)> {
    let pool = pg_client.pool_status();

    let db_health = match pg_client.get_connection().await {
        Ok(_conn) => ServiceHealth::healthy(),
        Err(err) => ServiceHealth::unhealthy(err.to_string()),
    };

    let status = if db_health.is_operational() {
        if pool.is_under_pressure() {
            ServiceStatus::Degraded
        } else {
            ServiceStatus::Healthy
        }
    } else {
        ServiceStatus::Unhealthy
    };

    let code = match status {
        ServiceStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        ServiceStatus::Healthy | ServiceStatus::Degraded => StatusCode::OK,
    };

    Ok((
        code,
        Json(HealthReport {
            status,
            pool_utilization: pool.utilization(),
            realtime_connections: hub.connection_count(),
        }),
    ))
}

fn health_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Health check").response::<200, Json<HealthReport>>()
}

/// Returns monitor routes.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/health", get_with(health, health_docs))
        .with_path_items(|item| item.tag("Monitors"))
}
