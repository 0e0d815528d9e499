//! Attachment metadata repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{Attachment, NewAttachment};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for attachment metadata operations.
///
/// Blob payloads live in object storage; these rows carry only metadata and
/// the opaque storage key.
pub trait AttachmentRepository {
    /// Records a new attachment.
    fn create_attachment(
        &mut self,
        new_attachment: NewAttachment,
    ) -> impl Future<Output = PgResult<Attachment>> + Send;

    /// Finds an attachment by ID.
    fn find_attachment_by_id(
        &mut self,
        attachment_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Attachment>>> + Send;

    /// Lists a record's attachments.
    fn list_attachments_for_record(
        &mut self,
        record_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Attachment>>> + Send;

    /// Lists all attachments stored in a field, for cleanup on field deletion.
    fn list_attachments_for_field(
        &mut self,
        field_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Attachment>>> + Send;

    /// Deletes an attachment row. Returns whether a row was removed.
    fn delete_attachment(
        &mut self,
        attachment_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;
}

impl AttachmentRepository for PgConnection {
    async fn create_attachment(&mut self, new_attachment: NewAttachment) -> PgResult<Attachment> {
        use schema::attachments;

        let attachment = diesel::insert_into(attachments::table)
            .values(&new_attachment)
            .returning(Attachment::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(attachment)
    }

    async fn find_attachment_by_id(&mut self, target_id: Uuid) -> PgResult<Option<Attachment>> {
        use schema::attachments::dsl::*;

        let attachment = attachments
            .filter(id.eq(target_id))
            .select(Attachment::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(attachment)
    }

    async fn list_attachments_for_record(
        &mut self,
        target_record: Uuid,
    ) -> PgResult<Vec<Attachment>> {
        use schema::attachments::dsl::*;

        let rows = attachments
            .filter(record_id.eq(target_record))
            .select(Attachment::as_select())
            .order(created_at.asc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn list_attachments_for_field(
        &mut self,
        target_field: Uuid,
    ) -> PgResult<Vec<Attachment>> {
        use schema::attachments::dsl::*;

        let rows = attachments
            .filter(field_id.eq(target_field))
            .select(Attachment::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn delete_attachment(&mut self, target_id: Uuid) -> PgResult<bool> {
        use schema::attachments::dsl::*;

        let deleted = diesel::delete(attachments)
            .filter(id.eq(target_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
