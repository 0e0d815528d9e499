//! Webhook repository for outbound HTTP subscribers.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewWebhook, UpdateWebhook, Webhook};
use crate::types::EventType;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for webhook database operations.
pub trait WebhookRepository {
    /// Creates a new webhook.
    fn create_webhook(
        &mut self,
        new_webhook: NewWebhook,
    ) -> impl Future<Output = PgResult<Webhook>> + Send;

    /// Finds a webhook by ID.
    fn find_webhook_by_id(
        &mut self,
        webhook_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Webhook>>> + Send;

    /// Lists all webhooks for a base.
    fn list_webhooks_for_base(
        &mut self,
        base_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Webhook>>> + Send;

    /// Finds active webhooks subscribed to a specific event type.
    fn find_webhooks_for_event(
        &mut self,
        base_id: Uuid,
        event: EventType,
    ) -> impl Future<Output = PgResult<Vec<Webhook>>> + Send;

    /// Updates a webhook.
    fn update_webhook(
        &mut self,
        webhook_id: Uuid,
        changes: UpdateWebhook,
    ) -> impl Future<Output = PgResult<Webhook>> + Send;

    /// Hard-deletes a webhook; its delivery history cascades.
    fn delete_webhook(&mut self, webhook_id: Uuid)
    -> impl Future<Output = PgResult<bool>> + Send;
}

impl WebhookRepository for PgConnection {
    async fn create_webhook(&mut self, new_webhook: NewWebhook) -> PgResult<Webhook> {
        use schema::webhooks;

        let webhook = diesel::insert_into(webhooks::table)
            .values(&new_webhook)
            .returning(Webhook::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(webhook)
    }

    async fn find_webhook_by_id(&mut self, webhook_id: Uuid) -> PgResult<Option<Webhook>> {
        use schema::webhooks::dsl::*;

        let webhook = webhooks
            .filter(id.eq(webhook_id))
            .select(Webhook::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(webhook)
    }

    async fn list_webhooks_for_base(&mut self, target_base: Uuid) -> PgResult<Vec<Webhook>> {
        use schema::webhooks::dsl::*;

        let rows = webhooks
            .filter(base_id.eq(target_base))
            .select(Webhook::as_select())
            .order(created_at.desc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn find_webhooks_for_event(
        &mut self,
        target_base: Uuid,
        event: EventType,
    ) -> PgResult<Vec<Webhook>> {
        use schema::webhooks::dsl::*;

        let rows = webhooks
            .filter(base_id.eq(target_base))
            .filter(is_active.eq(true))
            .filter(events.contains(vec![Some(event)]))
            .select(Webhook::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn update_webhook(
        &mut self,
        webhook_id: Uuid,
        changes: UpdateWebhook,
    ) -> PgResult<Webhook> {
        use schema::webhooks::dsl::*;

        let webhook = diesel::update(webhooks)
            .filter(id.eq(webhook_id))
            .set(&changes)
            .returning(Webhook::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(webhook)
    }

    async fn delete_webhook(&mut self, webhook_id: Uuid) -> PgResult<bool> {
        use schema::webhooks::dsl::*;

        let deleted = diesel::delete(webhooks)
            .filter(id.eq(webhook_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
