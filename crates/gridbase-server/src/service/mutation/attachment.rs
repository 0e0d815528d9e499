//! Attachment metadata operations.
//!
//! Blob bytes move through the object-storage service in the handler; the
//! mutation here records metadata and keeps the attachment cell of the
//! record in sync, which is what makes uploads visible as record updates.

use diesel_async::scoped_futures::ScopedFutureExt;
use gridbase_events::EventType;
use gridbase_postgres::model::{Attachment, NewActivity, NewAttachment, Record};
use gridbase_postgres::query::{
    ActivityRepository,
    AttachmentRepository, FieldRepository, RecordRepository, TableRepository,
};
use gridbase_postgres::types::{ActivityAction, CollaboratorRole, EntityKind, FieldType};
use uuid::Uuid;

use super::{
    MutationError, MutationResult, MutationService, event_for, record_snapshot,
};
use crate::extract::Identity;

impl MutationService {
    /// Records an uploaded file and appends it to the record's cell.
    #[allow(clippy::too_many_arguments)]
    pub async fn attach_file(
        &self,
        actor: &Identity,
        record_id: Uuid,
        field_id: Uuid,
        filename: String,
        content_type: String,
        size_bytes: i64,
        storage_key: String,
    ) -> MutationResult<(Attachment, Record)> {
        let mut conn = self.conn().await?;
        let record = conn
            .find_record_by_id(record_id)
            .await?
            .ok_or(MutationError::NotFound("record"))?;
        let field = conn
            .find_field_by_id(field_id)
            .await?
            .ok_or(MutationError::NotFound("field"))?;
        let table = conn
            .find_table_by_id(record.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        if field.table_id != record.table_id {
            return Err(MutationError::invalid(
                "field belongs to a different table",
            ));
        }
        if field.field_type != FieldType::Attachment {
            return Err(MutationError::invalid("field is not an attachment field"));
        }

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = record.table_id;
        let uploader_id = actor.user_id;
        let previous_values = record.values.clone();
        let (attachment, record) = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let attachment = conn
                        .create_attachment(NewAttachment {
                            record_id,
                            field_id,
                            uploader_id,
                            filename,
                            content_type,
                            size_bytes,
                            storage_key,
                        })
                        .await?;

                    // Append the attachment id to the record's cell.
                    let mut values = previous_values
                        .as_object()
                        .cloned()
                        .unwrap_or_default();
                    let key = field_id.to_string();
                    let mut cell: Vec<serde_json::Value> = values
                        .get(&key)
                        .and_then(|v| v.as_array())
                        .cloned()
                        .unwrap_or_default();
                    cell.push(serde_json::json!(attachment.id.to_string()));
                    values.insert(key, serde_json::Value::Array(cell));

                    let record = conn
                        .set_record_values(record_id, serde_json::Value::Object(values))
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: Some(record_id),
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Attachment,
                        changes: serde_json::json!({
                            "attachment_id": attachment.id,
                            "filename": attachment.filename,
                            "size_bytes": attachment.size_bytes,
                        }),
                    })
                    .await?;

                    Ok((attachment, record))
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::RecordUpdated, base_id)
                .with_table(table_id)
                .with_entity(record.id)
                .with_record(record_snapshot(&record)),
        );

        Ok((attachment, record))
    }

    /// Deletes an attachment row and removes it from the record's cell.
    ///
    /// Returns the storage key so the caller can delete the blob after
    /// commit.
    pub async fn delete_attachment(
        &self,
        actor: &Identity,
        attachment_id: Uuid,
    ) -> MutationResult<String> {
        let mut conn = self.conn().await?;
        let attachment = conn
            .find_attachment_by_id(attachment_id)
            .await?
            .ok_or(MutationError::NotFound("attachment"))?;
        let record = conn
            .find_record_by_id(attachment.record_id)
            .await?
            .ok_or(MutationError::NotFound("record"))?;
        let table = conn
            .find_table_by_id(record.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = record.table_id;
        let record_id = attachment.record_id;
        let field_key = attachment.field_id.to_string();
        let storage_key = attachment.storage_key.clone();
        let previous_values = record.values.clone();
        let filename = attachment.filename.clone();
        let record = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    conn.delete_attachment(attachment_id).await?;

                    let mut values = previous_values
                        .as_object()
                        .cloned()
                        .unwrap_or_default();
                    if let Some(cell) = values.get_mut(&field_key)
                        && let Some(items) = cell.as_array()
                    {
                        let remaining: Vec<serde_json::Value> = items
                            .iter()
                            .filter(|item| {
                                item.as_str() != Some(attachment_id.to_string().as_str())
                            })
                            .cloned()
                            .collect();
                        *cell = serde_json::Value::Array(remaining);
                    }

                    let record = conn
                        .set_record_values(record_id, serde_json::Value::Object(values))
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: Some(record_id),
                        user_id: journal_user,
                        action: ActivityAction::Delete,
                        entity: EntityKind::Attachment,
                        changes: serde_json::json!({
                            "attachment_id": attachment_id,
                            "filename": filename,
                        }),
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
                .with_record(record_snapshot(&record)),
        );

        Ok(storage_key)
    }
}
