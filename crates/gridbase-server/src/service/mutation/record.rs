//! Record lifecycle operations.
//!
//! Every record write validates incoming cell values against the table's
//! field types, re-derives computed cells, persists with the journal entry
//! in one transaction, and publishes exactly one event per logical change.

use diesel_async::scoped_futures::ScopedFutureExt;
use gridbase_events::EventType;
use gridbase_postgres::model::{Field, NewActivity, NewRecord, Record};
use gridbase_postgres::query::{
    ActivityRepository,
    AttachmentRepository, FieldRepository, RecordRepository, TableRepository,
};
use gridbase_postgres::types::{
    ActivityAction, CollaboratorRole, EntityKind, FieldOptions, FieldValue,
};
use uuid::Uuid;

use super::{
    InvalidInput, MutationError, MutationResult, MutationService, event_for, record_snapshot,
};
use crate::extract::Identity;
use crate::service::compute;

/// Row colour tags accepted by `set_record_color`.
pub const ROW_COLORS: &[&str] = &[
    "red", "orange", "yellow", "green", "blue", "purple", "pink", "gray",
];

impl MutationService {
    /// Creates a single record.
    pub async fn create_record(
        &self,
        actor: &Identity,
        table_id: Uuid,
        values: serde_json::Map<String, serde_json::Value>,
    ) -> MutationResult<Record> {
        let mut records = self
            .bulk_create_records(actor, table_id, vec![values])
            .await?;
        Ok(records.remove(0))
    }

    /// Creates records in bulk; returned order matches input order.
    ///
    /// Each created record is a logical change of its own: one journal
    /// entry and one `record.created` event per record, in input order.
    pub async fn bulk_create_records(
        &self,
        actor: &Identity,
        table_id: Uuid,
        values_list: Vec<serde_json::Map<String, serde_json::Value>>,
    ) -> MutationResult<Vec<Record>> {
        if values_list.is_empty() {
            return Err(InvalidInput::RecordsRequired.into());
        }

        let mut conn = self.conn().await?;
        let table = conn
            .find_table_by_id(table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let fields = conn.list_fields_for_table(table_id).await?;

        let mut prepared = Vec::with_capacity(values_list.len());
        for values in values_list {
            let validated = validated_values(&mut conn, &fields, None, values, true).await?;
            prepared.push(NewRecord {
                table_id,
                values: serde_json::Value::Object(validated),
            });
        }

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let records = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let records = conn.create_records(prepared).await?;

                    for record in &records {
                        conn.append_activity(NewActivity {
                            base_id,
                            table_id: Some(table_id),
                            record_id: Some(record.id),
                            user_id: journal_user,
                            action: ActivityAction::Create,
                            entity: EntityKind::Record,
                            changes: serde_json::json!({ "values": record.values }),
                        })
                        .await?;
                    }

                    Ok(records)
                }
                .scope_boxed()
            })
            .await?;

        for record in &records {
            self.publish(
                event_for(actor, EventType::RecordCreated, base_id)
                    .with_table(table_id)
                    .with_entity(record.id)
                    .with_record(record_snapshot(record)),
            );
        }

        Ok(records)
    }

    /// Replaces a record's cell values wholesale.
    pub async fn replace_record(
        &self,
        actor: &Identity,
        record_id: Uuid,
        values: serde_json::Map<String, serde_json::Value>,
    ) -> MutationResult<Record> {
        self.write_record_values(actor, record_id, values, true).await
    }

    /// Merges cell values into a record, field by field.
    ///
    /// A JSON `null` clears the addressed cell.
    pub async fn patch_record(
        &self,
        actor: &Identity,
        record_id: Uuid,
        values: serde_json::Map<String, serde_json::Value>,
    ) -> MutationResult<Record> {
        self.write_record_values(actor, record_id, values, false).await
    }

    async fn write_record_values(
        &self,
        actor: &Identity,
        record_id: Uuid,
        values: serde_json::Map<String, serde_json::Value>,
        replace: bool,
    ) -> MutationResult<Record> {
        let mut conn = self.conn().await?;
        let existing = conn
            .find_record_by_id(record_id)
            .await?
            .ok_or(MutationError::NotFound("record"))?;
        let table = conn
            .find_table_by_id(existing.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let fields = conn.list_fields_for_table(existing.table_id).await?;
        let previous = existing
            .values
            .as_object()
            .cloned()
            .unwrap_or_default();

        let validated =
            validated_values(&mut conn, &fields, Some(&previous), values, replace).await?;

        // The diff drives the journal entry and field-scoped automation
        // triggers downstream.
        let changed: serde_json::Map<String, serde_json::Value> = validated
            .iter()
            .filter(|(key, value)| previous.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = existing.table_id;
        let new_values = serde_json::Value::Object(validated);
        let journal_changes = serde_json::Value::Object(changed);
        let record = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let record = conn.set_record_values(record_id, new_values).await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: Some(record_id),
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Record,
                        changes: journal_changes,
                    })
                    .await?;

                    Ok(record)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::RecordUpdated, base_id)
                .with_table(table_id)
                .with_entity(record.id)
                .with_record(record_snapshot(&record))
                .with_old_record(serde_json::json!({
                    "values": serde_json::Value::Object(previous),
                })),
        );

        Ok(record)
    }

    /// Sets or clears a record's row colour.
    pub async fn set_record_color(
        &self,
        actor: &Identity,
        record_id: Uuid,
        color: Option<String>,
    ) -> MutationResult<Record> {
        if let Some(ref color) = color
            && !ROW_COLORS.contains(&color.as_str())
        {
            return Err(InvalidInput::InvalidColor(color.clone()).into());
        }

        let mut conn = self.conn().await?;
        let existing = conn
            .find_record_by_id(record_id)
            .await?
            .ok_or(MutationError::NotFound("record"))?;
        let table = conn
            .find_table_by_id(existing.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = existing.table_id;
        let new_color = color.clone();
        let record = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let record = conn.set_record_color(record_id, new_color).await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: Some(record_id),
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Record,
                        changes: serde_json::json!({ "row_color": record.row_color }),
                    })
                    .await?;

                    Ok(record)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::RecordUpdated, base_id)
                .with_table(table_id)
                .with_entity(record.id)
                .with_record(record_snapshot(&record))
                .with_old_record(serde_json::json!({
                    "values": existing.values,
                    "row_color": existing.row_color,
                })),
        );

        Ok(record)
    }

    /// Deletes a record; comments and attachment rows cascade.
    ///
    /// Returns the storage keys of the record's attachments for post-commit
    /// blob cleanup.
    pub async fn delete_record(
        &self,
        actor: &Identity,
        record_id: Uuid,
    ) -> MutationResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let existing = conn
            .find_record_by_id(record_id)
            .await?
            .ok_or(MutationError::NotFound("record"))?;
        let table = conn
            .find_table_by_id(existing.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let orphaned: Vec<String> = conn
            .list_attachments_for_record(record_id)
            .await?
            .into_iter()
            .map(|attachment| attachment.storage_key)
            .collect();

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = existing.table_id;
        let snapshot = record_snapshot(&existing);
        let journal_snapshot = snapshot.clone();
        conn.transaction::<_, MutationError, _>(|conn| {
            async move {
                conn.delete_record(record_id).await?;

                conn.append_activity(NewActivity {
                    base_id,
                    table_id: Some(table_id),
                    record_id: Some(record_id),
                    user_id: journal_user,
                    action: ActivityAction::Delete,
                    entity: EntityKind::Record,
                    changes: journal_snapshot,
                })
                .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        self.publish(
            event_for(actor, EventType::RecordDeleted, base_id)
                .with_table(table_id)
                .with_entity(record_id)
                .with_record(snapshot),
        );

        Ok(orphaned)
    }
}

/// Validates incoming cell values and re-derives computed cells.
///
/// With `replace` set, the result contains only the incoming cells; in
/// merge mode it starts from the record's previous values. JSON `null`
/// clears the addressed cell in both modes.
pub(crate) async fn validated_values(
    conn: &mut gridbase_postgres::PgConn,
    fields: &[Field],
    previous: Option<&serde_json::Map<String, serde_json::Value>>,
    incoming: serde_json::Map<String, serde_json::Value>,
    replace: bool,
) -> MutationResult<serde_json::Map<String, serde_json::Value>> {
    let mut merged = if replace {
        serde_json::Map::new()
    } else {
        previous.cloned().unwrap_or_default()
    };

    for (key, value) in incoming {
        let field_id = Uuid::parse_str(&key)
            .map_err(|_| MutationError::invalid(format!("`{key}` is not a field id")))?;
        let Some(field) = fields.iter().find(|f| f.id == field_id) else {
            return Err(MutationError::invalid(format!(
                "`{key}` is not a field of this table"
            )));
        };

        let options = FieldOptions::parse(field.field_type, &field.options)
            .map_err(|e| InvalidInput::InvalidFieldType(e.to_string()))?;

        match FieldValue::parse(field.field_type, &options, &value)
            .map_err(|e| InvalidInput::InvalidFieldType(e.to_string()))?
        {
            Some(parsed) => {
                merged.insert(key, parsed.into_json());
            }
            None => {
                merged.remove(&key);
            }
        }
    }

    compute::recompute_record(conn, fields, &mut merged)
        .await
        .map_err(|e| MutationError::internal(e))?;

    Ok(merged)
}
