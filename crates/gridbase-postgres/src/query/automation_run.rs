//! Automation run repository for execution history.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use uuid::Uuid;

use super::Pagination;
use crate::model::{AutomationRun, NewAutomationRun};
use crate::types::RunStatus;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for automation run records.
pub trait AutomationRunRepository {
    /// Allocates a new run row.
    fn create_automation_run(
        &mut self,
        new_run: NewAutomationRun,
    ) -> impl Future<Output = PgResult<AutomationRun>> + Send;

    /// Transitions a run to a terminal status.
    fn complete_automation_run(
        &mut self,
        run_id: Uuid,
        status: RunStatus,
        error: Option<String>,
        log: serde_json::Value,
    ) -> impl Future<Output = PgResult<AutomationRun>> + Send;

    /// Lists an automation's runs, newest first.
    fn list_automation_runs(
        &mut self,
        automation_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<AutomationRun>>> + Send;
}

impl AutomationRunRepository for PgConnection {
    async fn create_automation_run(
        &mut self,
        new_run: NewAutomationRun,
    ) -> PgResult<AutomationRun> {
        use schema::automation_runs;

        let run = diesel::insert_into(automation_runs::table)
            .values(&new_run)
            .returning(AutomationRun::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(run)
    }

    async fn complete_automation_run(
        &mut self,
        run_id: Uuid,
        status: RunStatus,
        run_error: Option<String>,
        log: serde_json::Value,
    ) -> PgResult<AutomationRun> {
        use schema::automation_runs::dsl::*;

        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        let run = diesel::update(automation_runs)
            .filter(id.eq(run_id))
            .set((
                run_status.eq(status),
                error.eq(run_error),
                run_log.eq(log),
                completed_at.eq(Some(now)),
            ))
            .returning(AutomationRun::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(run)
    }

    async fn list_automation_runs(
        &mut self,
        target_automation: Uuid,
        pagination: Pagination,
    ) -> PgResult<Vec<AutomationRun>> {
        use schema::automation_runs::dsl::*;

        let rows = automation_runs
            .filter(automation_id.eq(target_automation))
            .select(AutomationRun::as_select())
            .order(started_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }
}
