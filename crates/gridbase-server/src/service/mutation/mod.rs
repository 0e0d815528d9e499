//! The mutation service: the single entry point for every state-changing
//! operation.
//!
//! Each operation follows the same shape: resolve the caller's role on the
//! affected base, perform the write and the activity-journal append inside
//! one transaction, commit, then build the logical event and publish it to
//! the bus. Publication failure is logged and never undoes the write — the
//! commit has already happened, and the bus is non-blocking by
//! construction.

mod attachment;
mod automation;
mod base;
mod comment;
mod error;
mod field;
mod form;
mod record;
mod table;
mod view;
mod webhook;

pub use error::{InvalidInput, MutationError, MutationResult};
use gridbase_events::{BaseEvent, EventBus};
use gridbase_postgres::model::{Field, Record, Table, View};
use gridbase_postgres::{PgClient, PgConn};

/// Maximum causal depth for automation-produced mutations.
///
/// An automation whose action would push an event past this depth still
/// matches, but its run is recorded as skipped with a "max depth" reason.
pub const MAX_CAUSAL_DEPTH: u8 = 5;

/// Tracing target for mutation operations.
const TRACING_TARGET: &str = "gridbase_server::service::mutation";

/// The single choke point for state-changing operations.
///
/// Cloning is cheap; all clones share the connection pool and the event
/// bus. Handlers and the automation engine hold their own clones.
#[derive(Clone)]
pub struct MutationService {
    pg_client: PgClient,
    bus: EventBus,
}

impl MutationService {
    /// Creates a new mutation service.
    pub fn new(pg_client: PgClient, bus: EventBus) -> Self {
        Self { pg_client, bus }
    }

    /// Acquires a pooled connection.
    pub(crate) async fn conn(&self) -> MutationResult<PgConn> {
        self.pg_client
            .get_connection()
            .await
            .map_err(MutationError::from)
    }

    /// Publishes a committed-mutation event.
    ///
    /// Post-commit by contract: the write this event describes has already
    /// been persisted, so nothing here may fail the operation.
    pub(crate) fn publish(&self, event: BaseEvent) {
        let observers = self.bus.publish(event);
        tracing::trace!(
            target: TRACING_TARGET,
            observers,
            "event published"
        );
    }

    /// Returns the event bus this service publishes to.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl std::fmt::Debug for MutationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationService").finish_non_exhaustive()
    }
}

// Snapshot helpers shared by the domain operations. Events and journal
// entries carry these JSON shapes rather than internal model types.

pub(crate) fn record_snapshot(record: &Record) -> serde_json::Value {
    serde_json::json!({
        "id": record.id,
        "table_id": record.table_id,
        "values": record.values,
        "row_color": record.row_color,
        "created_at": record.created_at.to_jiff(),
        "updated_at": record.updated_at.to_jiff(),
    })
}

pub(crate) fn table_snapshot(table: &Table) -> serde_json::Value {
    serde_json::json!({
        "id": table.id,
        "base_id": table.base_id,
        "name": table.display_name,
        "position": table.position,
    })
}

pub(crate) fn field_snapshot(field: &Field) -> serde_json::Value {
    serde_json::json!({
        "id": field.id,
        "table_id": field.table_id,
        "name": field.display_name,
        "type": field.field_type,
        "options": field.options,
        "position": field.position,
    })
}

pub(crate) fn view_snapshot(view: &View) -> serde_json::Value {
    serde_json::json!({
        "id": view.id,
        "table_id": view.table_id,
        "name": view.display_name,
        "type": view.view_type,
        "config": view.config,
        "is_public": view.is_public,
    })
}

/// Starts an event builder carrying the actor's user id and causal depth.
pub(crate) fn event_for(
    actor: &crate::extract::Identity,
    event: gridbase_postgres::types::EventType,
    base_id: uuid::Uuid,
) -> BaseEvent {
    let mut event = BaseEvent::new(event, base_id).with_causal_depth(actor.causal_depth);
    if let Some(user_id) = actor.journal_user() {
        event = event.with_user(user_id);
    }
    event
}

/// Rejects empty or whitespace-only names.
pub(crate) fn require_name(name: &str) -> MutationResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InvalidInput::NameRequired.into());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_name_trims_whitespace() {
        assert_eq!(require_name("  Tasks  ").unwrap(), "Tasks");
        assert!(require_name("   ").is_err());
        assert!(require_name("").is_err());
    }
}
