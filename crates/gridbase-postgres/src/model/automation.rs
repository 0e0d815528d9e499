//! Automation model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::automations;
use crate::types::{AutomationActionType, AutomationTriggerType};

/// A trigger-driven rule attached to a table.
///
/// Disabled automations are skipped by the engine without producing runs.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = automations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Automation {
    /// Unique automation identifier.
    pub id: Uuid,
    /// The table whose events this automation watches.
    pub table_id: Uuid,
    /// Human-readable automation name.
    pub display_name: String,
    /// Whether the engine evaluates this automation.
    pub is_enabled: bool,
    /// The trigger condition.
    pub trigger_type: AutomationTriggerType,
    /// Trigger parameters (watched field, operator, value).
    pub trigger_config: serde_json::Value,
    /// The action executed on match.
    pub action_type: AutomationActionType,
    /// Action parameters (templates, target table, URL).
    pub action_config: serde_json::Value,
    /// Timestamp when the automation was created.
    pub created_at: Timestamp,
    /// Timestamp when the automation was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new automation.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = automations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewAutomation {
    /// The table whose events this automation watches.
    pub table_id: Uuid,
    /// Automation name.
    pub display_name: String,
    /// Whether the automation starts enabled.
    pub is_enabled: bool,
    /// Trigger condition.
    pub trigger_type: AutomationTriggerType,
    /// Trigger parameters.
    pub trigger_config: serde_json::Value,
    /// Action to execute.
    pub action_type: AutomationActionType,
    /// Action parameters.
    pub action_config: serde_json::Value,
}

/// Data for updating an automation.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = automations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateAutomation {
    /// New automation name.
    pub display_name: Option<String>,
    /// New enabled flag.
    pub is_enabled: Option<bool>,
    /// New trigger condition.
    pub trigger_type: Option<AutomationTriggerType>,
    /// New trigger parameters.
    pub trigger_config: Option<serde_json::Value>,
    /// New action.
    pub action_type: Option<AutomationActionType>,
    /// New action parameters.
    pub action_config: Option<serde_json::Value>,
}
