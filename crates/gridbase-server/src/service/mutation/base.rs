//! Base lifecycle and collaborator management operations.

use diesel_async::scoped_futures::ScopedFutureExt;
use gridbase_events::EventType;
use gridbase_postgres::model::{
    Base, BaseCollaborator, NewActivity, NewBase, NewBaseCollaborator, NewField, NewRecord,
    NewTable, NewView, UpdateBase,
};
use gridbase_postgres::query::{
    ActivityRepository,
    BaseCollaboratorRepository, BaseRepository, FieldRepository, RecordRepository,
    TableRepository, UserRepository, ViewRepository,
};
use gridbase_postgres::types::{ActivityAction, CollaboratorRole, EntityKind};
use std::collections::HashMap;
use uuid::Uuid;

use super::{
    InvalidInput, MutationError, MutationResult, MutationService, event_for, require_name,
};
use crate::extract::Identity;

impl MutationService {
    /// Creates a new base owned by the caller.
    ///
    /// The owner is inserted into the collaborator set with the owner role
    /// in the same transaction.
    pub async fn create_base(&self, actor: &Identity, name: &str) -> MutationResult<Base> {
        let display_name = require_name(name)?;
        if !actor.can_write() {
            return Err(MutationError::Forbidden);
        }

        let owner_id = actor.user_id;
        let journal_user = actor.journal_user();

        let mut conn = self.conn().await?;
        let base = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let base = conn
                        .create_base(NewBase {
                            display_name,
                            owner_id,
                        })
                        .await?;

                    conn.add_base_collaborator(NewBaseCollaborator {
                        base_id: base.id,
                        user_id: owner_id,
                        role: CollaboratorRole::Owner,
                    })
                    .await?;

                    conn.append_activity(NewActivity {
                        base_id: base.id,
                        table_id: None,
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Base,
                        changes: serde_json::json!({ "name": base.display_name }),
                    })
                    .await?;

                    Ok(base)
                }
                .scope_boxed()
            })
            .await?;

        Ok(base)
    }

    /// Renames a base.
    pub async fn rename_base(
        &self,
        actor: &Identity,
        base_id: Uuid,
        name: &str,
    ) -> MutationResult<Base> {
        let display_name = require_name(name)?;

        let mut conn = self.conn().await?;
        actor
            .require_role(&mut conn, base_id, CollaboratorRole::Editor)
            .await?;

        let journal_user = actor.journal_user();
        let base = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let previous = conn
                        .find_base_by_id(base_id)
                        .await?
                        .ok_or(MutationError::NotFound("base"))?;

                    let base = conn
                        .update_base(
                            base_id,
                            UpdateBase {
                                display_name: Some(display_name),
                            },
                        )
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: None,
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Base,
                        changes: serde_json::json!({
                            "name": base.display_name,
                            "previous_name": previous.display_name,
                        }),
                    })
                    .await?;

                    Ok(base)
                }
                .scope_boxed()
            })
            .await?;

        Ok(base)
    }

    /// Deletes a base and, through database cascades, its whole subtree.
    ///
    /// Emits a single `base.deleted` event; subscribers treat it as an
    /// invalidation of everything underneath. The base's journal is part of
    /// the cascaded subtree, so the deletion itself leaves no journal row.
    pub async fn delete_base(&self, actor: &Identity, base_id: Uuid) -> MutationResult<()> {
        let mut conn = self.conn().await?;
        actor
            .require_role(&mut conn, base_id, CollaboratorRole::Owner)
            .await?;

        let deleted = conn.delete_base(base_id).await?;
        if !deleted {
            return Err(MutationError::NotFound("base"));
        }

        self.publish(event_for(actor, EventType::BaseDeleted, base_id));

        Ok(())
    }

    /// Duplicates a base into a new base owned by the caller.
    ///
    /// Tables, fields, and views are always copied; records only when
    /// `include_records` is set. Field ids are remapped, and every
    /// occurrence of an old field id inside copied values and configs is
    /// rewritten to the new id.
    pub async fn duplicate_base(
        &self,
        actor: &Identity,
        base_id: Uuid,
        include_records: bool,
    ) -> MutationResult<Base> {
        let mut conn = self.conn().await?;
        actor
            .require_role(&mut conn, base_id, CollaboratorRole::Viewer)
            .await?;
        if !actor.can_write() {
            return Err(MutationError::Forbidden);
        }

        let source = conn
            .find_base_by_id(base_id)
            .await?
            .ok_or(MutationError::NotFound("base"))?;

        let owner_id = actor.user_id;
        let journal_user = actor.journal_user();
        let copy_name = format!("{} (copy)", source.display_name);

        let base = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let base = conn
                        .create_base(NewBase {
                            display_name: copy_name,
                            owner_id,
                        })
                        .await?;

                    conn.add_base_collaborator(NewBaseCollaborator {
                        base_id: base.id,
                        user_id: owner_id,
                        role: CollaboratorRole::Owner,
                    })
                    .await?;

                    let tables = conn.list_tables_for_base(base_id).await?;
                    for table in tables {
                        let new_table = conn
                            .create_table(NewTable {
                                base_id: base.id,
                                display_name: table.display_name.clone(),
                                position: table.position,
                            })
                            .await?;

                        let fields = conn.list_fields_for_table(table.id).await?;
                        let mut id_map: HashMap<Uuid, Uuid> = HashMap::new();
                        for field in &fields {
                            let new_field = conn
                                .create_field(NewField {
                                    table_id: new_table.id,
                                    display_name: field.display_name.clone(),
                                    field_type: field.field_type,
                                    options: field.options.clone(),
                                    position: field.position,
                                })
                                .await?;
                            id_map.insert(field.id, new_field.id);
                        }

                        for view in conn.list_views_for_table(table.id).await? {
                            conn.create_view(NewView {
                                table_id: new_table.id,
                                display_name: view.display_name,
                                view_type: view.view_type,
                                config: remap_ids(view.config, &id_map),
                            })
                            .await?;
                        }

                        if include_records {
                            let mut page = gridbase_postgres::query::Pagination::new(1000, 0);
                            loop {
                                let records =
                                    conn.list_records_for_table(table.id, page).await?;
                                if records.is_empty() {
                                    break;
                                }
                                let copies: Vec<NewRecord> = records
                                    .iter()
                                    .map(|record| NewRecord {
                                        table_id: new_table.id,
                                        values: remap_ids(record.values.clone(), &id_map),
                                    })
                                    .collect();
                                conn.create_records(copies).await?;
                                page.offset += page.limit;
                            }
                        }
                    }

                    conn.append_activity(NewActivity {
                        base_id: base.id,
                        table_id: None,
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Base,
                        changes: serde_json::json!({
                            "name": base.display_name,
                            "duplicated_from": base_id,
                            "include_records": include_records,
                        }),
                    })
                    .await?;

                    Ok(base)
                }
                .scope_boxed()
            })
            .await?;

        Ok(base)
    }

    /// Adds a collaborator to a base by email address.
    pub async fn add_collaborator(
        &self,
        actor: &Identity,
        base_id: Uuid,
        email: &str,
        role: CollaboratorRole,
    ) -> MutationResult<BaseCollaborator> {
        let mut conn = self.conn().await?;
        actor
            .require_role(&mut conn, base_id, CollaboratorRole::Owner)
            .await?;

        if role == CollaboratorRole::Owner {
            return Err(MutationError::Conflict(
                "a base has exactly one owner".into(),
            ));
        }

        let email = email.trim();
        if email.is_empty() {
            return Err(InvalidInput::EmailRequired.into());
        }

        let user = conn
            .find_user_by_email(email)
            .await?
            .ok_or(MutationError::NotFound("user"))?;

        let journal_user = actor.journal_user();
        let collaborator = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let collaborator = conn
                        .add_base_collaborator(NewBaseCollaborator {
                            base_id,
                            user_id: user.id,
                            role,
                        })
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: None,
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Collaborator,
                        changes: serde_json::json!({
                            "user_id": user.id,
                            "role": role,
                        }),
                    })
                    .await?;

                    Ok(collaborator)
                }
                .scope_boxed()
            })
            .await?;

        Ok(collaborator)
    }

    /// Changes a collaborator's role.
    ///
    /// The owner row cannot be role-changed, and the owner role cannot be
    /// granted; both surface as conflicts.
    pub async fn update_collaborator(
        &self,
        actor: &Identity,
        base_id: Uuid,
        user_id: Uuid,
        role: CollaboratorRole,
    ) -> MutationResult<BaseCollaborator> {
        let mut conn = self.conn().await?;
        actor
            .require_role(&mut conn, base_id, CollaboratorRole::Owner)
            .await?;

        if role == CollaboratorRole::Owner {
            return Err(MutationError::Conflict(
                "the owner role cannot be granted".into(),
            ));
        }

        let existing = conn
            .find_base_collaborator(base_id, user_id)
            .await?
            .ok_or(MutationError::NotFound("collaborator"))?;

        if existing.role == CollaboratorRole::Owner {
            return Err(MutationError::Conflict(
                "the owner's role cannot be changed".into(),
            ));
        }

        let journal_user = actor.journal_user();
        let collaborator = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let collaborator = conn
                        .update_collaborator_role(base_id, user_id, role)
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: None,
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Collaborator,
                        changes: serde_json::json!({
                            "user_id": user_id,
                            "role": role,
                            "previous_role": existing.role,
                        }),
                    })
                    .await?;

                    Ok(collaborator)
                }
                .scope_boxed()
            })
            .await?;

        Ok(collaborator)
    }

    /// Removes a collaborator from a base.
    ///
    /// The owner row cannot be removed.
    pub async fn remove_collaborator(
        &self,
        actor: &Identity,
        base_id: Uuid,
        user_id: Uuid,
    ) -> MutationResult<()> {
        let mut conn = self.conn().await?;
        actor
            .require_role(&mut conn, base_id, CollaboratorRole::Owner)
            .await?;

        let existing = conn
            .find_base_collaborator(base_id, user_id)
            .await?
            .ok_or(MutationError::NotFound("collaborator"))?;

        if existing.role == CollaboratorRole::Owner {
            return Err(MutationError::Conflict(
                "the owner cannot be removed".into(),
            ));
        }

        let journal_user = actor.journal_user();
        conn.transaction::<_, MutationError, _>(|conn| {
            async move {
                conn.remove_base_collaborator(base_id, user_id).await?;

                conn.append_activity(NewActivity {
                    base_id,
                    table_id: None,
                    record_id: None,
                    user_id: journal_user,
                    action: ActivityAction::Delete,
                    entity: EntityKind::Collaborator,
                    changes: serde_json::json!({ "user_id": user_id }),
                })
                .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        Ok(())
    }
}

/// Rewrites every string occurrence of an old field id to its duplicate.
///
/// Values, view configs, and form fields all reference fields by UUID
/// string; a deep walk keeps the remap independent of each config's shape.
pub(crate) fn remap_ids(
    value: serde_json::Value,
    id_map: &HashMap<Uuid, Uuid>,
) -> serde_json::Value {
    match value {
        serde_json::Value::String(text) => {
            if let Ok(id) = Uuid::parse_str(&text)
                && let Some(new_id) = id_map.get(&id)
            {
                return serde_json::Value::String(new_id.to_string());
            }
            serde_json::Value::String(text)
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(
            items.into_iter().map(|item| remap_ids(item, id_map)).collect(),
        ),
        serde_json::Value::Object(entries) => serde_json::Value::Object(
            entries
                .into_iter()
                .map(|(key, entry)| {
                    let key = match Uuid::parse_str(&key) {
                        Ok(id) => id_map
                            .get(&id)
                            .map(|new_id| new_id.to_string())
                            .unwrap_or(key),
                        Err(_) => key,
                    };
                    (key, remap_ids(entry, id_map))
                })
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_rewrites_keys_and_values() {
        let old_id = Uuid::new_v4();
        let new_id = Uuid::new_v4();
        let mut id_map = HashMap::new();
        id_map.insert(old_id, new_id);

        let input = serde_json::json!({
            old_id.to_string(): "hello",
            "filters": [{ "field_id": old_id.to_string(), "op": "equals" }],
        });

        let output = remap_ids(input, &id_map);

        assert!(output.get(new_id.to_string()).is_some());
        assert!(output.get(old_id.to_string()).is_none());
        assert_eq!(
            output["filters"][0]["field_id"],
            serde_json::json!(new_id.to_string())
        );
    }

    #[test]
    fn remap_leaves_unrelated_strings_alone() {
        let id_map = HashMap::new();
        let input = serde_json::json!({"note": "not-a-uuid", "n": 4});
        assert_eq!(remap_ids(input.clone(), &id_map), input);
    }
}
