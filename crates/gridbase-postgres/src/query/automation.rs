//! Automation repository for trigger-driven rules.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{Automation, NewAutomation, UpdateAutomation};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for automation database operations.
///
/// Enabled-automation listings are ordered by id ascending; the engine
/// relies on that order for deterministic per-event execution.
pub trait AutomationRepository {
    /// Creates a new automation.
    fn create_automation(
        &mut self,
        new_automation: NewAutomation,
    ) -> impl Future<Output = PgResult<Automation>> + Send;

    /// Finds an automation by ID.
    fn find_automation_by_id(
        &mut self,
        automation_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Automation>>> + Send;

    /// Lists all automations on a table.
    fn list_automations_for_table(
        &mut self,
        table_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Automation>>> + Send;

    /// Lists enabled automations on a table in id order.
    fn list_enabled_automations_for_table(
        &mut self,
        table_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Automation>>> + Send;

    /// Updates an automation.
    fn update_automation(
        &mut self,
        automation_id: Uuid,
        changes: UpdateAutomation,
    ) -> impl Future<Output = PgResult<Automation>> + Send;

    /// Flips an automation's enabled flag, returning the updated row.
    fn toggle_automation(
        &mut self,
        automation_id: Uuid,
    ) -> impl Future<Output = PgResult<Automation>> + Send;

    /// Hard-deletes an automation; its run history cascades.
    fn delete_automation(
        &mut self,
        automation_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;
}

impl AutomationRepository for PgConnection {
    async fn create_automation(&mut self, new_automation: NewAutomation) -> PgResult<Automation> {
        use schema::automations;

        let automation = diesel::insert_into(automations::table)
            .values(&new_automation)
            .returning(Automation::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(automation)
    }

    async fn find_automation_by_id(&mut self, target_id: Uuid) -> PgResult<Option<Automation>> {
        use schema::automations::dsl::*;

        let automation = automations
            .filter(id.eq(target_id))
            .select(Automation::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(automation)
    }

    async fn list_automations_for_table(
        &mut self,
        target_table: Uuid,
    ) -> PgResult<Vec<Automation>> {
        use schema::automations::dsl::*;

        let rows = automations
            .filter(table_id.eq(target_table))
            .select(Automation::as_select())
            .order(created_at.asc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn list_enabled_automations_for_table(
        &mut self,
        target_table: Uuid,
    ) -> PgResult<Vec<Automation>> {
        use schema::automations::dsl::*;

        let rows = automations
            .filter(table_id.eq(target_table))
            .filter(is_enabled.eq(true))
            .select(Automation::as_select())
            .order(id.asc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn update_automation(
        &mut self,
        target_id: Uuid,
        changes: UpdateAutomation,
    ) -> PgResult<Automation> {
        use schema::automations::dsl::*;

        let automation = diesel::update(automations)
            .filter(id.eq(target_id))
            .set(&changes)
            .returning(Automation::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(automation)
    }

    async fn toggle_automation(&mut self, target_id: Uuid) -> PgResult<Automation> {
        use schema::automations::dsl::*;

        let automation = diesel::update(automations)
            .filter(id.eq(target_id))
            .set(is_enabled.eq(diesel::dsl::not(is_enabled)))
            .returning(Automation::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(automation)
    }

    async fn delete_automation(&mut self, target_id: Uuid) -> PgResult<bool> {
        use schema::automations::dsl::*;

        let deleted = diesel::delete(automations)
            .filter(id.eq(target_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
