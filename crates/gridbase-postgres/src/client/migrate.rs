//! Embedded migration management for the database client.

use std::time::{Duration, Instant};

use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Outcome of a migration run.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    /// Versions of the migrations applied during this run.
    pub applied: Vec<String>,
    /// Total wall-clock time spent applying migrations.
    pub duration: Duration,
}

impl MigrationResult {
    /// Returns whether any migration was applied.
    pub fn applied_any(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Run all pending migrations on the database.
///
/// Migrations are embedded into the binary at compile time; running them is
/// idempotent and safe to invoke on every startup.
#[tracing::instrument(skip(pg), target = TRACING_TARGET_MIGRATION)]
pub async fn run_pending_migrations(pg: &PgClient) -> PgResult<MigrationResult> {
    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        "Starting database migration process",
    );

    let start_time = Instant::now();
    let conn = pg.get_pooled_connection().await?;

    let mut conn: AsyncConnectionWrapper<_> = conn.into();
    let results = spawn_blocking(move || match conn.run_pending_migrations(MIGRATIONS) {
        Ok(versions) => Ok(versions
            .into_iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()),
        Err(x) => Err(x),
    })
    .await;

    let duration = start_time.elapsed();
    let results = results.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_MIGRATION,
            duration = ?duration,
            error = %err,
            "Migration task panicked, join error occurred"
        );

        PgError::Migration(err.into())
    })?;

    let versions = results.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_MIGRATION,
            duration = ?duration,
            error = &err,
            "Database migration process failed"
        );

        PgError::Migration(err)
    })?;

    tracing::info!(
        target: TRACING_TARGET_MIGRATION,
        duration = ?duration,
        migrations_count = versions.len(),
        "Database migration process completed successfully"
    );

    Ok(MigrationResult {
        applied: versions,
        duration,
    })
}

/// Extension trait providing migration functionality for [`PgClient`].
pub trait PgClientExt {
    /// Runs all pending database migrations.
    ///
    /// Applies any unapplied migrations to bring the database schema up to
    /// date. Safe to call multiple times.
    ///
    /// # Errors
    ///
    /// Returns an error if any migration fails to apply or if there are
    /// connectivity issues with the database.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<MigrationResult>>;
}

impl PgClientExt for PgClient {
    async fn run_pending_migrations(&self) -> PgResult<MigrationResult> {
        run_pending_migrations(self).await
    }
}
