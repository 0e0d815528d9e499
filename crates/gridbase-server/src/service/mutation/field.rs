//! Field lifecycle operations.
//!
//! Field mutations are where schema validity is enforced: type options are
//! validated against the declared type, computed fields must keep the
//! dependency graph acyclic, and type changes are admitted only when every
//! existing value is compatible with the new type.

use std::collections::HashSet;

use diesel::sql_types::{Text, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt;
use gridbase_events::EventType;
use gridbase_postgres::model::{Field, NewActivity, NewField, UpdateField};
use gridbase_postgres::query::{
    ActivityRepository,
    AttachmentRepository, FieldRepository, Pagination, RecordRepository, TableRepository,
};
use gridbase_postgres::types::{
    ActivityAction, CollaboratorRole, EntityKind, FieldOptions, FieldType, FieldValue,
};
use uuid::Uuid;

use super::{
    InvalidInput, MutationError, MutationResult, MutationService, event_for, field_snapshot,
    require_name,
};
use crate::extract::Identity;
use crate::service::compute;

impl MutationService {
    /// Creates a new field at the end of the table.
    pub async fn create_field(
        &self,
        actor: &Identity,
        table_id: Uuid,
        name: &str,
        field_type: FieldType,
        options: serde_json::Value,
    ) -> MutationResult<Field> {
        let display_name = require_name(name)?;

        let mut conn = self.conn().await?;
        let table = conn
            .find_table_by_id(table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let parsed = FieldOptions::parse(field_type, &options)
            .map_err(|e| InvalidInput::InvalidFieldType(e.to_string()))?;
        self.validate_linked_table(&mut conn, table.base_id, &parsed)
            .await?;

        // Cycle check against the table's current fields plus the candidate.
        let mut fields = conn.list_fields_for_table(table_id).await?;
        if field_type.is_computed() {
            fields.push(candidate_field(table_id, &display_name, field_type, &options));
            compute::reject_cycles(&fields)
                .map_err(|e| InvalidInput::InvalidFieldType(e.to_string()))?;
        }

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let field = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let position = conn.next_field_position(table_id).await?;
                    let field = conn
                        .create_field(NewField {
                            table_id,
                            display_name,
                            field_type,
                            options,
                            position,
                        })
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Field,
                        changes: serde_json::json!({
                            "name": field.display_name,
                            "type": field.field_type,
                        }),
                    })
                    .await?;

                    Ok(field)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::FieldCreated, base_id)
                .with_table(table_id)
                .with_entity(field.id)
                .with_record(field_snapshot(&field)),
        );

        Ok(field)
    }

    /// Updates a field's name, options, or type.
    ///
    /// A type change is admitted only when every stored value parses under
    /// the new type and options.
    pub async fn update_field(
        &self,
        actor: &Identity,
        field_id: Uuid,
        name: Option<&str>,
        new_type: Option<FieldType>,
        options: Option<serde_json::Value>,
    ) -> MutationResult<Field> {
        let mut conn = self.conn().await?;
        let existing = conn
            .find_field_by_id(field_id)
            .await?
            .ok_or(MutationError::NotFound("field"))?;
        let table = conn
            .find_table_by_id(existing.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let display_name = name.map(require_name).transpose()?;
        let effective_type = new_type.unwrap_or(existing.field_type);
        let effective_options = options.clone().unwrap_or_else(|| existing.options.clone());

        let parsed = FieldOptions::parse(effective_type, &effective_options)
            .map_err(|e| InvalidInput::InvalidFieldType(e.to_string()))?;
        self.validate_linked_table(&mut conn, table.base_id, &parsed)
            .await?;

        let type_changed = effective_type != existing.field_type;
        let options_changed = effective_options != existing.options;

        if (type_changed || options_changed) && !effective_type.is_computed() {
            self.validate_existing_values(
                &mut conn,
                existing.table_id,
                field_id,
                effective_type,
                &parsed,
            )
            .await?;
        }

        if effective_type.is_computed() && (type_changed || options_changed) {
            let mut fields = conn.list_fields_for_table(existing.table_id).await?;
            for field in fields.iter_mut() {
                if field.id == field_id {
                    field.field_type = effective_type;
                    field.options = effective_options.clone();
                }
            }
            compute::reject_cycles(&fields)
                .map_err(|e| InvalidInput::InvalidFieldType(e.to_string()))?;
        }

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = existing.table_id;
        let field = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let field = conn
                        .update_field(
                            field_id,
                            UpdateField {
                                display_name,
                                field_type: new_type,
                                options,
                            },
                        )
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Field,
                        changes: serde_json::json!({
                            "name": field.display_name,
                            "type": field.field_type,
                        }),
                    })
                    .await?;

                    Ok(field)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::FieldUpdated, base_id)
                .with_table(table_id)
                .with_entity(field.id)
                .with_record(field_snapshot(&field)),
        );

        Ok(field)
    }

    /// Atomically reorders a table's fields.
    pub async fn reorder_fields(
        &self,
        actor: &Identity,
        table_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> MutationResult<Vec<Field>> {
        let mut conn = self.conn().await?;
        let table = conn
            .find_table_by_id(table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let current = conn.list_fields_for_table(table_id).await?;
        let current_ids: HashSet<Uuid> = current.iter().map(|f| f.id).collect();
        let supplied_ids: HashSet<Uuid> = ordered_ids.iter().copied().collect();

        if supplied_ids.len() != ordered_ids.len() || supplied_ids != current_ids {
            return Err(MutationError::invalid(
                "reorder must cover exactly the table's fields",
            ));
        }

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let order: Vec<Uuid> = ordered_ids.to_vec();
        let fields = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    for (position, field_id) in order.iter().enumerate() {
                        conn.set_field_position(*field_id, position as i32).await?;
                    }

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Field,
                        changes: serde_json::json!({ "order": order }),
                    })
                    .await?;

                    conn.list_fields_for_table(table_id).await.map_err(Into::into)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::FieldUpdated, base_id)
                .with_table(table_id)
                .with_record(serde_json::json!({ "order": ordered_ids })),
        );

        Ok(fields)
    }

    /// Deletes a field, stripping its key from every record in the table.
    ///
    /// Returns the storage keys of attachments that lived in the field so
    /// the caller can delete the blobs after commit.
    pub async fn delete_field(
        &self,
        actor: &Identity,
        field_id: Uuid,
    ) -> MutationResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let field = conn
            .find_field_by_id(field_id)
            .await?
            .ok_or(MutationError::NotFound("field"))?;
        let table = conn
            .find_table_by_id(field.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let orphaned: Vec<String> = conn
            .list_attachments_for_field(field_id)
            .await?
            .into_iter()
            .map(|attachment| attachment.storage_key)
            .collect();

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = field.table_id;
        let field_name = field.display_name.clone();
        conn.transaction::<_, MutationError, _>(|conn| {
            async move {
                conn.delete_field(field_id).await?;

                // Keep the record-values invariant: keys are always a
                // subset of the table's live field ids.
                diesel::sql_query(
                    "UPDATE records SET values = values - $1 WHERE table_id = $2",
                )
                .bind::<Text, _>(field_id.to_string())
                .bind::<SqlUuid, _>(table_id)
                .execute(conn)
                .await?;

                conn.append_activity(NewActivity {
                    base_id,
                    table_id: Some(table_id),
                    record_id: None,
                    user_id: journal_user,
                    action: ActivityAction::Delete,
                    entity: EntityKind::Field,
                    changes: serde_json::json!({ "name": field_name }),
                })
                .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        self.publish(
            event_for(actor, EventType::FieldDeleted, base_id)
                .with_table(table_id)
                .with_entity(field_id),
        );

        Ok(orphaned)
    }

    /// Verifies a linked-record configuration targets a table in the same
    /// base.
    async fn validate_linked_table(
        &self,
        conn: &mut gridbase_postgres::PgConn,
        base_id: Uuid,
        options: &FieldOptions,
    ) -> MutationResult<()> {
        let FieldOptions::LinkedRecord(linked) = options else {
            return Ok(());
        };

        let Some(target) = conn.find_table_by_id(linked.linked_table_id).await? else {
            return Err(MutationError::NotFound("linked table"));
        };

        if target.base_id != base_id {
            return Err(InvalidInput::InvalidFieldType(
                "linked table belongs to a different base".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Verifies every stored value of a field parses under a new type.
    async fn validate_existing_values(
        &self,
        conn: &mut gridbase_postgres::PgConn,
        table_id: Uuid,
        field_id: Uuid,
        new_type: FieldType,
        options: &FieldOptions,
    ) -> MutationResult<()> {
        let key = field_id.to_string();
        let mut page = Pagination::new(1000, 0);

        loop {
            let records = conn.list_records_for_table(table_id, page).await?;
            if records.is_empty() {
                return Ok(());
            }

            for record in &records {
                let Some(value) = record.values.get(&key) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                FieldValue::parse(new_type, options, value).map_err(|e| {
                    InvalidInput::InvalidFieldType(format!(
                        "record {} is incompatible: {}",
                        record.id, e
                    ))
                })?;
            }

            page.offset += page.limit;
        }
    }
}

/// Builds an in-memory field candidate for pre-persistence cycle checks.
fn candidate_field(
    table_id: Uuid,
    display_name: &str,
    field_type: FieldType,
    options: &serde_json::Value,
) -> Field {
    let now = jiff_diesel::Timestamp::from(jiff::Timestamp::now());
    Field {
        id: Uuid::new_v4(),
        table_id,
        display_name: display_name.to_string(),
        field_type,
        options: options.clone(),
        position: i32::MAX,
        created_at: now,
        updated_at: now,
    }
}
