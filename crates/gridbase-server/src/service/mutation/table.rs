//! Table lifecycle operations.

use std::collections::HashSet;

use diesel_async::scoped_futures::ScopedFutureExt;
use gridbase_events::EventType;
use gridbase_postgres::model::{
    NewActivity, NewField, NewRecord, NewTable, NewView, Table, UpdateTable,
};
use gridbase_postgres::query::{
    ActivityRepository,
    FieldRepository, Pagination, RecordRepository, TableRepository, ViewRepository,
};
use gridbase_postgres::types::{ActivityAction, CollaboratorRole, EntityKind, ViewType};
use uuid::Uuid;

use super::base::remap_ids;
use super::{
    MutationError, MutationResult, MutationService, event_for, require_name, table_snapshot,
};
use crate::extract::Identity;

impl MutationService {
    /// Creates a new table at the end of the base, with its default grid
    /// view.
    pub async fn create_table(
        &self,
        actor: &Identity,
        base_id: Uuid,
        name: &str,
    ) -> MutationResult<Table> {
        let display_name = require_name(name)?;

        let mut conn = self.conn().await?;
        actor
            .require_role(&mut conn, base_id, CollaboratorRole::Editor)
            .await?;

        let journal_user = actor.journal_user();
        let table = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let position = conn.next_table_position(base_id).await?;
                    let table = conn
                        .create_table(NewTable {
                            base_id,
                            display_name,
                            position,
                        })
                        .await?;

                    // Every table starts with a default grid view.
                    conn.create_view(NewView {
                        table_id: table.id,
                        display_name: "Grid".to_string(),
                        view_type: ViewType::Grid,
                        config: serde_json::json!({}),
                    })
                    .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table.id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Table,
                        changes: serde_json::json!({ "name": table.display_name }),
                    })
                    .await?;

                    Ok(table)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::TableCreated, base_id)
                .with_table(table.id)
                .with_entity(table.id)
                .with_record(table_snapshot(&table)),
        );

        Ok(table)
    }

    /// Renames a table.
    pub async fn rename_table(
        &self,
        actor: &Identity,
        table_id: Uuid,
        name: &str,
    ) -> MutationResult<Table> {
        let display_name = require_name(name)?;

        let mut conn = self.conn().await?;
        let existing = conn
            .find_table_by_id(table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, existing.base_id, CollaboratorRole::Editor)
            .await?;

        let journal_user = actor.journal_user();
        let previous_name = existing.display_name.clone();
        let table = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let table = conn
                        .update_table(
                            table_id,
                            UpdateTable {
                                display_name: Some(display_name),
                            },
                        )
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id: table.base_id,
                        table_id: Some(table.id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Table,
                        changes: serde_json::json!({
                            "name": table.display_name,
                            "previous_name": previous_name,
                        }),
                    })
                    .await?;

                    Ok(table)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::TableUpdated, table.base_id)
                .with_table(table.id)
                .with_entity(table.id)
                .with_record(table_snapshot(&table)),
        );

        Ok(table)
    }

    /// Atomically reorders a base's tables.
    ///
    /// The supplied list must be a permutation of the base's current table
    /// set; anything else is invalid input and nothing moves.
    pub async fn reorder_tables(
        &self,
        actor: &Identity,
        base_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> MutationResult<Vec<Table>> {
        let mut conn = self.conn().await?;
        actor
            .require_role(&mut conn, base_id, CollaboratorRole::Editor)
            .await?;

        let current = conn.list_tables_for_base(base_id).await?;
        let current_ids: HashSet<Uuid> = current.iter().map(|t| t.id).collect();
        let supplied_ids: HashSet<Uuid> = ordered_ids.iter().copied().collect();

        if supplied_ids.len() != ordered_ids.len() || supplied_ids != current_ids {
            return Err(MutationError::invalid(
                "reorder must cover exactly the base's tables",
            ));
        }

        let journal_user = actor.journal_user();
        let order: Vec<Uuid> = ordered_ids.to_vec();
        let tables = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    for (position, table_id) in order.iter().enumerate() {
                        conn.set_table_position(*table_id, position as i32).await?;
                    }

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: None,
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Table,
                        changes: serde_json::json!({ "order": order }),
                    })
                    .await?;

                    conn.list_tables_for_base(base_id).await.map_err(Into::into)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::TableUpdated, base_id)
                .with_record(serde_json::json!({ "order": ordered_ids })),
        );

        Ok(tables)
    }

    /// Duplicates a table within its base, records included.
    pub async fn duplicate_table(
        &self,
        actor: &Identity,
        table_id: Uuid,
    ) -> MutationResult<Table> {
        let mut conn = self.conn().await?;
        let source = conn
            .find_table_by_id(table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, source.base_id, CollaboratorRole::Editor)
            .await?;

        let journal_user = actor.journal_user();
        let base_id = source.base_id;
        let copy_name = format!("{} (copy)", source.display_name);
        let table = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let position = conn.next_table_position(base_id).await?;
                    let table = conn
                        .create_table(NewTable {
                            base_id,
                            display_name: copy_name,
                            position,
                        })
                        .await?;

                    let fields = conn.list_fields_for_table(table_id).await?;
                    let mut id_map = std::collections::HashMap::new();
                    for field in &fields {
                        let new_field = conn
                            .create_field(NewField {
                                table_id: table.id,
                                display_name: field.display_name.clone(),
                                field_type: field.field_type,
                                options: field.options.clone(),
                                position: field.position,
                            })
                            .await?;
                        id_map.insert(field.id, new_field.id);
                    }

                    for view in conn.list_views_for_table(table_id).await? {
                        conn.create_view(NewView {
                            table_id: table.id,
                            display_name: view.display_name,
                            view_type: view.view_type,
                            config: remap_ids(view.config, &id_map),
                        })
                        .await?;
                    }

                    let mut page = Pagination::new(1000, 0);
                    loop {
                        let records = conn.list_records_for_table(table_id, page).await?;
                        if records.is_empty() {
                            break;
                        }
                        let copies: Vec<NewRecord> = records
                            .iter()
                            .map(|record| NewRecord {
                                table_id: table.id,
                                values: remap_ids(record.values.clone(), &id_map),
                            })
                            .collect();
                        conn.create_records(copies).await?;
                        page.offset += page.limit;
                    }

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table.id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Table,
                        changes: serde_json::json!({
                            "name": table.display_name,
                            "duplicated_from": table_id,
                        }),
                    })
                    .await?;

                    Ok(table)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::TableCreated, base_id)
                .with_table(table.id)
                .with_entity(table.id)
                .with_record(table_snapshot(&table)),
        );

        Ok(table)
    }

    /// Deletes a table; fields, records, views, forms, and automations
    /// cascade in the database.
    pub async fn delete_table(&self, actor: &Identity, table_id: Uuid) -> MutationResult<()> {
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
        let table_name = table.display_name.clone();
        conn.transaction::<_, MutationError, _>(|conn| {
            async move {
                conn.delete_table(table_id).await?;

                conn.append_activity(NewActivity {
                    base_id,
                    table_id: Some(table_id),
                    record_id: None,
                    user_id: journal_user,
                    action: ActivityAction::Delete,
                    entity: EntityKind::Table,
                    changes: serde_json::json!({ "name": table_name }),
                })
                .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        self.publish(
            event_for(actor, EventType::TableDeleted, base_id)
                .with_table(table_id)
                .with_entity(table_id),
        );

        Ok(())
    }
}
