//! Request payload and path-parameter types for all handlers.

use std::collections::HashMap;

use gridbase_postgres::query::Pagination;
use gridbase_postgres::types::{
    ApiScope, AutomationActionType, AutomationTriggerType, CollaboratorRole, EventType,
    FieldType, FormField, ViewType,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Path parameters

/// Path parameters addressing a base.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct BasePathParams {
    /// The base identifier.
    pub base_id: Uuid,
}

/// Path parameters addressing a collaborator of a base.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct CollaboratorPathParams {
    /// The base identifier.
    pub base_id: Uuid,
    /// The collaborator's user identifier.
    pub user_id: Uuid,
}

/// Path parameters addressing a table.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct TablePathParams {
    /// The table identifier.
    pub table_id: Uuid,
}

/// Path parameters addressing a field.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct FieldPathParams {
    /// The field identifier.
    pub field_id: Uuid,
}

/// Path parameters addressing a record.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct RecordPathParams {
    /// The record identifier.
    pub record_id: Uuid,
}

/// Path parameters addressing one field of one record.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct RecordFieldPathParams {
    /// The record identifier.
    pub record_id: Uuid,
    /// The field identifier.
    pub field_id: Uuid,
}

/// Path parameters addressing a view.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct ViewPathParams {
    /// The view identifier.
    pub view_id: Uuid,
}

/// Path parameters addressing a form.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct FormPathParams {
    /// The form identifier.
    pub form_id: Uuid,
}

/// Path parameters addressing a comment.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct CommentPathParams {
    /// The comment identifier.
    pub comment_id: Uuid,
}

/// Path parameters addressing an attachment.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct AttachmentPathParams {
    /// The attachment identifier.
    pub attachment_id: Uuid,
}

/// Path parameters addressing a webhook.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct WebhookPathParams {
    /// The webhook identifier.
    pub webhook_id: Uuid,
}

/// Path parameters addressing an API key.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct ApiKeyPathParams {
    /// The key identifier.
    pub key_id: Uuid,
}

/// Path parameters addressing an automation.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct AutomationPathParams {
    /// The automation identifier.
    pub automation_id: Uuid,
}

/// Path parameters addressing a session.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct SessionPathParams {
    /// The session identifier.
    pub session_id: Uuid,
}

/// Path parameter carrying a public token.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TokenPathParams {
    /// The opaque public token.
    pub token: String,
}

// Query parameters

/// Pagination query parameters shared by listing endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize, JsonSchema)]
pub struct PaginationQuery {
    /// Maximum number of rows to return (1-1000, default 50).
    #[serde(default)]
    pub limit: Option<i64>,
    /// Number of rows to skip.
    #[serde(default)]
    pub offset: Option<i64>,
}

impl From<PaginationQuery> for Pagination {
    fn from(query: PaginationQuery) -> Self {
        match (query.limit, query.offset) {
            (None, None) => Pagination::default(),
            (limit, offset) => Pagination::new(limit.unwrap_or(50), offset.unwrap_or(0)),
        }
    }
}

// Authentication

/// Request payload for signing in.
///
/// A first sign-in with an unknown email creates the account, which is why
/// the display name is accepted here.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct LoginRequest {
    /// Email address; compared case-insensitively.
    #[validate(email)]
    pub email: String,
    /// Password; length is checked in the handler so the dedicated
    /// `password_too_short` code can surface.
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    /// Display name used when the sign-in creates the account.
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
}

/// Request payload for starting a password reset.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ForgotPasswordRequest {
    /// Email address of the account.
    #[validate(email)]
    pub email: String,
}

/// Request payload for completing a password reset.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ResetPasswordRequest {
    /// The reset token from the emailed link.
    #[validate(length(min = 1))]
    pub token: String,
    /// The new password; length is checked in the handler.
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Request payload for updating the caller's profile.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
pub struct UpdateProfileRequest {
    /// New display name.
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    /// New password; length is checked in the handler.
    #[validate(length(min = 1, max = 128))]
    pub password: Option<String>,
}

// Bases & collaborators

/// Request payload for creating or renaming a base.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct BaseNameRequest {
    /// The base name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// Request payload for duplicating a base.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct DuplicateBaseRequest {
    /// Whether records are copied along with the schema.
    #[serde(default)]
    pub include_records: bool,
}

/// Request payload for adding a collaborator.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct AddCollaboratorRequest {
    /// Email address of the user to add.
    #[validate(email)]
    pub email: String,
    /// The granted role; `owner` is rejected.
    pub role: CollaboratorRole,
}

/// Request payload for changing a collaborator's role.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateCollaboratorRequest {
    /// The new role; `owner` is rejected.
    pub role: CollaboratorRole,
}

// Tables

/// Request payload for creating or renaming a table.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct TableNameRequest {
    /// The table name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// Request payload for an atomic reorder.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ReorderRequest {
    /// The complete set of ids in their new order.
    #[validate(length(min = 1))]
    pub ordered_ids: Vec<Uuid>,
}

// Fields

/// Request payload for creating a field.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CreateFieldRequest {
    /// The field name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// The field's value type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Type-specific options.
    #[serde(default)]
    pub options: serde_json::Value,
}

/// Request payload for updating a field.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
pub struct UpdateFieldRequest {
    /// New field name.
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// New value type; only valid when compatible with stored values.
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    /// New type-specific options.
    pub options: Option<serde_json::Value>,
}

// Records

/// Request payload for creating or writing a record.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecordValuesRequest {
    /// Cell values keyed by field id.
    #[serde(default)]
    pub values: serde_json::Map<String, serde_json::Value>,
}

/// Request payload for bulk record creation.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BulkCreateRecordsRequest {
    /// The records to create, in order.
    pub records: Vec<RecordValuesRequest>,
}

/// Request payload for setting a record's row colour.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SetRecordColorRequest {
    /// The colour tag, or `null` to clear.
    pub color: Option<String>,
}

// Views

/// Request payload for creating a view.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CreateViewRequest {
    /// The view name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Presentation type.
    #[serde(rename = "type", default)]
    pub view_type: ViewType,
    /// Filters, sorts, grouping, and type-specific options.
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Request payload for updating a view.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
pub struct UpdateViewRequest {
    /// New view name.
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// New presentation type.
    #[serde(rename = "type")]
    pub view_type: Option<ViewType>,
    /// New configuration.
    pub config: Option<serde_json::Value>,
}

/// Request payload for publishing or unpublishing a view.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetViewPublicRequest {
    /// Whether the view is reachable via its public token.
    pub is_public: bool,
}

// Forms

/// Request payload for creating a form.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CreateFormRequest {
    /// The form name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Per-field presentation settings.
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// Request payload for updating a form.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
pub struct UpdateFormRequest {
    /// New form name.
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// Whether the form accepts submissions.
    pub is_active: Option<bool>,
}

/// Request payload for replacing a form's fields.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateFormFieldsRequest {
    /// The new per-field presentation settings.
    pub fields: Vec<FormField>,
}

// Comments

/// Request payload for creating a comment.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CreateCommentRequest {
    /// Comment body.
    #[validate(length(min = 1, max = 10_000))]
    pub content: String,
    /// Parent comment for threaded replies.
    pub parent_id: Option<Uuid>,
}

/// Request payload for editing a comment.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct UpdateCommentRequest {
    /// New comment body.
    #[validate(length(min = 1, max = 10_000))]
    pub content: String,
}

/// Request payload for resolving or reopening a comment thread.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ResolveCommentRequest {
    /// The new resolved flag; defaults to resolving.
    #[serde(default = "default_true")]
    pub resolved: bool,
}

fn default_true() -> bool {
    true
}

// Webhooks

/// Request payload for registering a webhook.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CreateWebhookRequest {
    /// Human-readable webhook name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Endpoint URL.
    #[validate(url, length(min = 1, max = 2048))]
    pub url: String,
    /// Subscribed event types.
    pub events: Vec<EventType>,
    /// Optional signing secret.
    #[validate(length(max = 256))]
    pub secret: Option<String>,
    /// Whether the webhook starts active.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Request payload for updating a webhook.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
pub struct UpdateWebhookRequest {
    /// New webhook name.
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// New endpoint URL.
    #[validate(url, length(min = 1, max = 2048))]
    pub url: Option<String>,
    /// New subscription set.
    pub events: Option<Vec<EventType>>,
    /// New signing secret.
    #[validate(length(max = 256))]
    pub secret: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

// API keys

/// Request payload for creating an API key.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CreateApiKeyRequest {
    /// Human-readable key name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Granted scopes; defaults to read and write.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<ApiScope>,
}

fn default_scopes() -> Vec<ApiScope> {
    vec![ApiScope::Read, ApiScope::Write]
}

// Automations

/// Request payload for creating an automation.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CreateAutomationRequest {
    /// Human-readable automation name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// The trigger condition.
    pub trigger_type: AutomationTriggerType,
    /// Trigger parameters.
    #[serde(default)]
    pub trigger_config: serde_json::Value,
    /// The action to execute.
    pub action_type: AutomationActionType,
    /// Action parameters.
    #[serde(default)]
    pub action_config: serde_json::Value,
}

/// Request payload for updating an automation.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
pub struct UpdateAutomationRequest {
    /// New automation name.
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// New enabled flag.
    pub is_enabled: Option<bool>,
    /// New trigger condition; config must accompany a type change.
    pub trigger_type: Option<AutomationTriggerType>,
    /// New trigger parameters.
    pub trigger_config: Option<serde_json::Value>,
    /// New action type; config must accompany a type change.
    pub action_type: Option<AutomationActionType>,
    /// New action parameters.
    pub action_config: Option<serde_json::Value>,
}

// Import/export

/// JSON-body variant of a CSV import.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ImportRequest {
    /// The CSV payload.
    pub data: String,
    /// CSV column name → field id; unmapped columns are ignored.
    #[serde(default)]
    pub mappings: HashMap<String, Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_query_defaults() {
        let query = PaginationQuery::default();
        let pagination: Pagination = query.into();
        assert_eq!(pagination, Pagination::default());

        let query = PaginationQuery {
            limit: Some(10),
            offset: Some(20),
        };
        let pagination: Pagination = query.into();
        assert_eq!(pagination, Pagination::new(10, 20));
    }

    #[test]
    fn login_request_validates_email_and_presence() {
        let bad = LoginRequest {
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
            display_name: None,
        };
        assert!(bad.validate().is_err());

        let empty = LoginRequest {
            email: "ana@example.com".to_string(),
            password: String::new(),
            display_name: None,
        };
        assert!(empty.validate().is_err());

        let ok = LoginRequest {
            email: "ana@example.com".to_string(),
            password: "longenough".to_string(),
            display_name: Some("Ana".to_string()),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn field_type_round_trips_through_rename() {
        let json = serde_json::json!({
            "name": "Status",
            "type": "single_select",
            "options": {"choices": ["todo"]},
        });
        let request: CreateFieldRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.field_type, FieldType::SingleSelect);
    }
}
