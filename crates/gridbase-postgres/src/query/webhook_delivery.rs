//! Webhook delivery repository for the append-only delivery audit trail.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::Pagination;
use crate::model::{NewWebhookDelivery, WebhookDelivery};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for webhook delivery records.
pub trait WebhookDeliveryRepository {
    /// Records one delivery attempt, success or failure.
    fn record_webhook_delivery(
        &mut self,
        new_delivery: NewWebhookDelivery,
    ) -> impl Future<Output = PgResult<WebhookDelivery>> + Send;

    /// Lists a webhook's delivery history, newest first.
    fn list_webhook_deliveries(
        &mut self,
        webhook_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<WebhookDelivery>>> + Send;
}

impl WebhookDeliveryRepository for PgConnection {
    async fn record_webhook_delivery(
        &mut self,
        new_delivery: NewWebhookDelivery,
    ) -> PgResult<WebhookDelivery> {
        use schema::webhook_deliveries;

        let delivery = diesel::insert_into(webhook_deliveries::table)
            .values(&new_delivery)
            .returning(WebhookDelivery::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(delivery)
    }

    async fn list_webhook_deliveries(
        &mut self,
        target_webhook: Uuid,
        pagination: Pagination,
    ) -> PgResult<Vec<WebhookDelivery>> {
        use schema::webhook_deliveries::dsl::*;

        let rows = webhook_deliveries
            .filter(webhook_id.eq(target_webhook))
            .select(WebhookDelivery::as_select())
            .order(created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }
}
