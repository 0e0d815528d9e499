//! Automation run model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::automation_runs;
use crate::types::RunStatus;

/// One execution of one automation against one event.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = automation_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AutomationRun {
    /// Unique run identifier.
    pub id: Uuid,
    /// The automation that ran.
    pub automation_id: Uuid,
    /// Lifecycle status of the run.
    pub run_status: RunStatus,
    /// Error description for failed runs.
    pub error: Option<String>,
    /// Structured execution log (expanded templates, action outcome).
    pub run_log: serde_json::Value,
    /// Timestamp when the run started.
    pub started_at: Timestamp,
    /// Timestamp when the run reached a terminal status.
    pub completed_at: Option<Timestamp>,
}

/// Data for allocating a new run.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = automation_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewAutomationRun {
    /// The automation being run.
    pub automation_id: Uuid,
    /// Initial status, normally `running`.
    pub run_status: RunStatus,
    /// Initial log payload.
    pub run_log: serde_json::Value,
}
