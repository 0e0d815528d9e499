//! Attachment metadata model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::attachments;

/// Metadata for a file attached to a record cell.
///
/// The storage key is opaque to the core; it is produced by the object
/// storage adapter. Rows cascade from record and field deletion.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Attachment {
    /// Unique attachment identifier.
    pub id: Uuid,
    /// The record this attachment belongs to.
    pub record_id: Uuid,
    /// The attachment field this file sits in.
    pub field_id: Uuid,
    /// The uploading account.
    pub uploader_id: Uuid,
    /// Original file name.
    pub filename: String,
    /// MIME content type.
    pub content_type: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// Opaque object storage key.
    pub storage_key: String,
    /// Timestamp when the file was uploaded.
    pub created_at: Timestamp,
}

/// Data for recording a new attachment.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewAttachment {
    /// The record this attachment belongs to.
    pub record_id: Uuid,
    /// The attachment field this file sits in.
    pub field_id: Uuid,
    /// The uploading account.
    pub uploader_id: Uuid,
    /// Original file name.
    pub filename: String,
    /// MIME content type.
    pub content_type: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// Opaque object storage key.
    pub storage_key: String,
}
