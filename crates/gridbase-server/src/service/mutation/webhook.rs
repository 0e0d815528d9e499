//! Webhook registration operations.
//!
//! Registrations are plain CRUD with journaling; delivery happens in the
//! webhook worker off the event bus.

use diesel_async::scoped_futures::ScopedFutureExt;
use gridbase_postgres::model::{NewActivity, NewWebhook, UpdateWebhook, Webhook};
use gridbase_postgres::query::{ActivityRepository, WebhookRepository};
use gridbase_postgres::types::{ActivityAction, CollaboratorRole, EntityKind, EventType};
use url::Url;
use uuid::Uuid;

use super::{MutationError, MutationResult, MutationService, require_name};
use crate::extract::Identity;

impl MutationService {
    /// Registers a webhook on a base.
    pub async fn create_webhook(
        &self,
        actor: &Identity,
        base_id: Uuid,
        name: &str,
        url: &str,
        events: Vec<EventType>,
        secret: Option<String>,
        is_active: bool,
    ) -> MutationResult<Webhook> {
        let display_name = require_name(name)?;
        let url = validate_webhook_url(url)?;
        validate_event_set(&events)?;

        let mut conn = self.conn().await?;
        actor
            .require_role(&mut conn, base_id, CollaboratorRole::Editor)
            .await?;

        let journal_user = actor.journal_user();
        let subscribed: Vec<Option<EventType>> = events.into_iter().map(Some).collect();
        let webhook = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let webhook = conn
                        .create_webhook(NewWebhook {
                            base_id,
                            display_name,
                            url: url.to_string(),
                            events: subscribed,
                            secret,
                            is_active,
                        })
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: None,
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Webhook,
                        changes: serde_json::json!({
                            "name": webhook.display_name,
                            "url": webhook.url,
                        }),
                    })
                    .await?;

                    Ok(webhook)
                }
                .scope_boxed()
            })
            .await?;

        Ok(webhook)
    }

    /// Updates a webhook's configuration.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_webhook(
        &self,
        actor: &Identity,
        webhook_id: Uuid,
        name: Option<&str>,
        url: Option<&str>,
        events: Option<Vec<EventType>>,
        secret: Option<String>,
        is_active: Option<bool>,
    ) -> MutationResult<Webhook> {
        let display_name = name.map(require_name).transpose()?;
        let url = url
            .map(|raw| validate_webhook_url(raw).map(|u| u.to_string()))
            .transpose()?;
        if let Some(ref events) = events {
            validate_event_set(events)?;
        }

        let mut conn = self.conn().await?;
        let existing = conn
            .find_webhook_by_id(webhook_id)
            .await?
            .ok_or(MutationError::NotFound("webhook"))?;
        actor
            .require_role(&mut conn, existing.base_id, CollaboratorRole::Editor)
            .await?;

        let journal_user = actor.journal_user();
        let base_id = existing.base_id;
        let subscribed = events.map(|events| events.into_iter().map(Some).collect());
        let webhook = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let webhook = conn
                        .update_webhook(
                            webhook_id,
                            UpdateWebhook {
                                display_name,
                                url,
                                events: subscribed,
                                secret,
                                is_active,
                            },
                        )
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: None,
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Webhook,
                        changes: serde_json::json!({
                            "name": webhook.display_name,
                            "is_active": webhook.is_active,
                        }),
                    })
                    .await?;

                    Ok(webhook)
                }
                .scope_boxed()
            })
            .await?;

        Ok(webhook)
    }

    /// Removes a webhook and its delivery history.
    pub async fn delete_webhook(
        &self,
        actor: &Identity,
        webhook_id: Uuid,
    ) -> MutationResult<()> {
        let mut conn = self.conn().await?;
        let existing = conn
            .find_webhook_by_id(webhook_id)
            .await?
            .ok_or(MutationError::NotFound("webhook"))?;
        actor
            .require_role(&mut conn, existing.base_id, CollaboratorRole::Editor)
            .await?;

        let journal_user = actor.journal_user();
        let base_id = existing.base_id;
        let webhook_name = existing.display_name.clone();
        conn.transaction::<_, MutationError, _>(|conn| {
            async move {
                conn.delete_webhook(webhook_id).await?;

                conn.append_activity(NewActivity {
                    base_id,
                    table_id: None,
                    record_id: None,
                    user_id: journal_user,
                    action: ActivityAction::Delete,
                    entity: EntityKind::Webhook,
                    changes: serde_json::json!({ "name": webhook_name }),
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

/// Parses and restricts webhook URLs to HTTP(S).
fn validate_webhook_url(raw: &str) -> MutationResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| MutationError::invalid(format!("invalid webhook URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(MutationError::invalid(
            "webhook URLs must use http or https",
        ));
    }

    Ok(url)
}

/// Rejects empty or non-subscribable event sets.
fn validate_event_set(events: &[EventType]) -> MutationResult<()> {
    if events.is_empty() {
        return Err(MutationError::invalid(
            "a webhook must subscribe to at least one event",
        ));
    }

    for event in events {
        if !event.is_subscribable() {
            return Err(MutationError::invalid(format!(
                "`{event}` is not a subscribable event"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(validate_webhook_url("https://sink.example.com/hook").is_ok());
        assert!(validate_webhook_url("ftp://sink.example.com").is_err());
        assert!(validate_webhook_url("not a url").is_err());
    }

    #[test]
    fn event_set_validation() {
        assert!(validate_event_set(&[EventType::RecordCreated]).is_ok());
        assert!(validate_event_set(&[]).is_err());
        assert!(validate_event_set(&[EventType::WebhookTest]).is_err());
    }
}
