//! Automation registration operations.

use diesel_async::scoped_futures::ScopedFutureExt;
use gridbase_postgres::model::{Automation, NewActivity, NewAutomation, UpdateAutomation};
use gridbase_postgres::query::{ActivityRepository, AutomationRepository, TableRepository};
use gridbase_postgres::types::{
    ActivityAction, AutomationActionType, AutomationTriggerType, CollaboratorRole, EntityKind,
};
use uuid::Uuid;

use super::{InvalidInput, MutationError, MutationResult, MutationService, require_name};
use crate::extract::Identity;
use crate::service::automation::{ActionConfig, TriggerConfig};

impl MutationService {
    /// Creates an automation on a table.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_automation(
        &self,
        actor: &Identity,
        table_id: Uuid,
        name: &str,
        trigger_type: AutomationTriggerType,
        trigger_config: serde_json::Value,
        action_type: AutomationActionType,
        action_config: serde_json::Value,
    ) -> MutationResult<Automation> {
        let display_name = require_name(name)?;

        TriggerConfig::parse(trigger_type, &trigger_config)
            .map_err(|e| InvalidInput::Invalid(e.to_string()))?;
        ActionConfig::parse(action_type, &action_config)
            .map_err(|e| InvalidInput::Invalid(e.to_string()))?;

        let mut conn = self.conn().await?;
        let table = conn
            .find_table_by_id(table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let automation = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let automation = conn
                        .create_automation(NewAutomation {
                            table_id,
                            display_name,
                            is_enabled: true,
                            trigger_type,
                            trigger_config,
                            action_type,
                            action_config,
                        })
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Automation,
                        changes: serde_json::json!({
                            "name": automation.display_name,
                            "trigger": automation.trigger_type,
                            "action": automation.action_type,
                        }),
                    })
                    .await?;

                    Ok(automation)
                }
                .scope_boxed()
            })
            .await?;

        Ok(automation)
    }

    /// Updates an automation's configuration.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_automation(
        &self,
        actor: &Identity,
        automation_id: Uuid,
        name: Option<&str>,
        is_enabled: Option<bool>,
        trigger: Option<(AutomationTriggerType, serde_json::Value)>,
        action: Option<(AutomationActionType, serde_json::Value)>,
    ) -> MutationResult<Automation> {
        let display_name = name.map(require_name).transpose()?;

        if let Some((trigger_type, ref config)) = trigger {
            TriggerConfig::parse(trigger_type, config)
                .map_err(|e| InvalidInput::Invalid(e.to_string()))?;
        }
        if let Some((action_type, ref config)) = action {
            ActionConfig::parse(action_type, config)
                .map_err(|e| InvalidInput::Invalid(e.to_string()))?;
        }

        let (mut conn, existing, base_id) = self.load_automation(actor, automation_id).await?;

        let journal_user = actor.journal_user();
        let table_id = existing.table_id;
        let (trigger_type, trigger_config) = trigger.map_or((None, None), |(t, c)| (Some(t), Some(c)));
        let (action_type, action_config) = action.map_or((None, None), |(t, c)| (Some(t), Some(c)));
        let automation = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let automation = conn
                        .update_automation(
                            automation_id,
                            UpdateAutomation {
                                display_name,
                                is_enabled,
                                trigger_type,
                                trigger_config,
                                action_type,
                                action_config,
                            },
                        )
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Automation,
                        changes: serde_json::json!({
                            "name": automation.display_name,
                            "is_enabled": automation.is_enabled,
                        }),
                    })
                    .await?;

                    Ok(automation)
                }
                .scope_boxed()
            })
            .await?;

        Ok(automation)
    }

    /// Flips an automation's enabled flag.
    pub async fn toggle_automation(
        &self,
        actor: &Identity,
        automation_id: Uuid,
    ) -> MutationResult<Automation> {
        let (mut conn, existing, base_id) = self.load_automation(actor, automation_id).await?;

        let journal_user = actor.journal_user();
        let table_id = existing.table_id;
        let automation = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let automation = conn.toggle_automation(automation_id).await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Automation,
                        changes: serde_json::json!({
                            "name": automation.display_name,
                            "is_enabled": automation.is_enabled,
                        }),
                    })
                    .await?;

                    Ok(automation)
                }
                .scope_boxed()
            })
            .await?;

        Ok(automation)
    }

    /// Deletes an automation and its run history.
    pub async fn delete_automation(
        &self,
        actor: &Identity,
        automation_id: Uuid,
    ) -> MutationResult<()> {
        let (mut conn, existing, base_id) = self.load_automation(actor, automation_id).await?;

        let journal_user = actor.journal_user();
        let table_id = existing.table_id;
        let automation_name = existing.display_name.clone();
        conn.transaction::<_, MutationError, _>(|conn| {
            async move {
                conn.delete_automation(automation_id).await?;

                conn.append_activity(NewActivity {
                    base_id,
                    table_id: Some(table_id),
                    record_id: None,
                    user_id: journal_user,
                    action: ActivityAction::Delete,
                    entity: EntityKind::Automation,
                    changes: serde_json::json!({ "name": automation_name }),
                })
                .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        Ok(())
    }

    /// Loads an automation and checks editor rights on its base.
    async fn load_automation(
        &self,
        actor: &Identity,
        automation_id: Uuid,
    ) -> MutationResult<(gridbase_postgres::PgConn, Automation, Uuid)> {
        let mut conn = self.conn().await?;
        let automation = conn
            .find_automation_by_id(automation_id)
            .await?
            .ok_or(MutationError::NotFound("automation"))?;
        let table = conn
            .find_table_by_id(automation.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        Ok((conn, automation, table.base_id))
    }
}
