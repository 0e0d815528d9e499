//! View lifecycle operations.

use diesel_async::scoped_futures::ScopedFutureExt;
use gridbase_events::EventType;
use gridbase_postgres::model::{NewActivity, NewView, UpdateView, View};
use gridbase_postgres::query::{ActivityRepository, TableRepository, ViewRepository};
use gridbase_postgres::types::{ActivityAction, CollaboratorRole, EntityKind, ViewType};
use uuid::Uuid;

use super::{
    MutationError, MutationResult, MutationService, event_for, require_name, view_snapshot,
};
use crate::extract::Identity;
use crate::service::auth::generate_token;

impl MutationService {
    /// Creates a new view on a table.
    pub async fn create_view(
        &self,
        actor: &Identity,
        table_id: Uuid,
        name: &str,
        view_type: ViewType,
        config: serde_json::Value,
    ) -> MutationResult<View> {
        let display_name = require_name(name)?;

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
        let view = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let view = conn
                        .create_view(NewView {
                            table_id,
                            display_name,
                            view_type,
                            config,
                        })
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::View,
                        changes: serde_json::json!({
                            "name": view.display_name,
                            "type": view.view_type,
                        }),
                    })
                    .await?;

                    Ok(view)
                }
                .scope_boxed()
            })
            .await?;

        Ok(view)
    }

    /// Updates a view's name, type, or configuration.
    pub async fn update_view(
        &self,
        actor: &Identity,
        view_id: Uuid,
        name: Option<&str>,
        view_type: Option<ViewType>,
        config: Option<serde_json::Value>,
    ) -> MutationResult<View> {
        let mut conn = self.conn().await?;
        let existing = conn
            .find_view_by_id(view_id)
            .await?
            .ok_or(MutationError::NotFound("view"))?;
        let table = conn
            .find_table_by_id(existing.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        let display_name = name.map(require_name).transpose()?;

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = existing.table_id;
        let view = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let view = conn
                        .update_view(
                            view_id,
                            UpdateView {
                                display_name,
                                view_type,
                                config,
                            },
                        )
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::View,
                        changes: serde_json::json!({
                            "name": view.display_name,
                            "type": view.view_type,
                        }),
                    })
                    .await?;

                    Ok(view)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::ViewUpdated, base_id)
                .with_table(table_id)
                .with_entity(view.id)
                .with_record(view_snapshot(&view)),
        );

        Ok(view)
    }

    /// Publishes or unpublishes a view. Owner only.
    ///
    /// The public token is generated on first publish and kept across
    /// unpublish/republish cycles, so re-publishing yields the same URL.
    pub async fn set_view_public(
        &self,
        actor: &Identity,
        view_id: Uuid,
        public: bool,
    ) -> MutationResult<View> {
        let mut conn = self.conn().await?;
        let existing = conn
            .find_view_by_id(view_id)
            .await?
            .ok_or(MutationError::NotFound("view"))?;
        let table = conn
            .find_table_by_id(existing.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Owner)
            .await?;

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = existing.table_id;
        let fresh_token = existing
            .public_token
            .is_none()
            .then(|| generate_token().raw);
        let view = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let view = if public {
                        conn.publish_view(view_id, fresh_token).await?
                    } else {
                        conn.unpublish_view(view_id).await?
                    };

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::View,
                        changes: serde_json::json!({
                            "name": view.display_name,
                            "is_public": view.is_public,
                        }),
                    })
                    .await?;

                    Ok(view)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(actor, EventType::ViewUpdated, base_id)
                .with_table(table_id)
                .with_entity(view.id)
                .with_record(view_snapshot(&view)),
        );

        Ok(view)
    }

    /// Deletes a view.
    pub async fn delete_view(&self, actor: &Identity, view_id: Uuid) -> MutationResult<()> {
        let mut conn = self.conn().await?;
        let existing = conn
            .find_view_by_id(view_id)
            .await?
            .ok_or(MutationError::NotFound("view"))?;
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
        let view_name = existing.display_name.clone();
        conn.transaction::<_, MutationError, _>(|conn| {
            async move {
                conn.delete_view(view_id).await?;

                conn.append_activity(NewActivity {
                    base_id,
                    table_id: Some(table_id),
                    record_id: None,
                    user_id: journal_user,
                    action: ActivityAction::Delete,
                    entity: EntityKind::View,
                    changes: serde_json::json!({ "name": view_name }),
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
