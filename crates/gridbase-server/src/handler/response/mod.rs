//! Response types for all handlers.

mod error_response;

pub use error_response::ErrorResponse;
use gridbase_postgres::model;
use gridbase_postgres::types::{
    ActivityAction, ApiScope, AutomationActionType, AutomationTriggerType, CollaboratorRole,
    EntityKind, EventType, FieldType, RunStatus, ViewType,
};
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

/// A simple confirmation message.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
}

impl MessageResponse {
    /// Creates a new confirmation message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The caller's profile.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct UserProfile {
    /// Account identifier.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// When the account was created.
    pub created_at: Timestamp,
}

impl From<model::User> for UserProfile {
    fn from(user: model::User) -> Self {
        Self {
            id: user.id,
            email: user.email_address,
            display_name: user.display_name,
            created_at: user.created_at.to_jiff(),
        }
    }
}

/// A successful sign-in.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LoginResponse {
    /// The opaque session token; presented as `Authorization: Bearer`.
    pub token: String,
    /// The signed-in account.
    pub user: UserProfile,
}

/// One of the caller's sessions.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SessionInfo {
    /// Session identifier.
    pub id: Uuid,
    /// IP address the session was created from.
    pub ip_address: Option<String>,
    /// User agent of the creating client.
    pub user_agent: Option<String>,
    /// When the session was issued.
    pub issued_at: Timestamp,
    /// When the session expires.
    pub expires_at: Timestamp,
    /// When the session was last used.
    pub last_seen_at: Option<Timestamp>,
}

impl From<model::Session> for SessionInfo {
    fn from(session: model::Session) -> Self {
        Self {
            id: session.id,
            ip_address: session.ip_address.map(|ip| ip.to_string()),
            user_agent: session.user_agent,
            issued_at: session.issued_at.to_jiff(),
            expires_at: session.expires_at.to_jiff(),
            last_seen_at: session.last_seen_at.map(|t| t.to_jiff()),
        }
    }
}

/// A base visible to the caller.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct BaseInfo {
    /// Base identifier.
    pub id: Uuid,
    /// Base name.
    pub name: String,
    /// Owning account.
    pub owner_id: Uuid,
    /// When the base was created.
    pub created_at: Timestamp,
    /// When the base was last updated.
    pub updated_at: Timestamp,
}

impl From<model::Base> for BaseInfo {
    fn from(base: model::Base) -> Self {
        Self {
            id: base.id,
            name: base.display_name,
            owner_id: base.owner_id,
            created_at: base.created_at.to_jiff(),
            updated_at: base.updated_at.to_jiff(),
        }
    }
}

/// A collaborator row of a base.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CollaboratorInfo {
    /// The base.
    pub base_id: Uuid,
    /// The member account.
    pub user_id: Uuid,
    /// The member's role.
    pub role: CollaboratorRole,
    /// When the membership was created.
    pub created_at: Timestamp,
}

impl From<model::BaseCollaborator> for CollaboratorInfo {
    fn from(collaborator: model::BaseCollaborator) -> Self {
        Self {
            base_id: collaborator.base_id,
            user_id: collaborator.user_id,
            role: collaborator.role,
            created_at: collaborator.created_at.to_jiff(),
        }
    }
}

/// A table of a base.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableInfo {
    /// Table identifier.
    pub id: Uuid,
    /// The owning base.
    pub base_id: Uuid,
    /// Table name.
    pub name: String,
    /// Display position within the base.
    pub position: i32,
    /// When the table was created.
    pub created_at: Timestamp,
    /// When the table was last updated.
    pub updated_at: Timestamp,
}

impl From<model::Table> for TableInfo {
    fn from(table: model::Table) -> Self {
        Self {
            id: table.id,
            base_id: table.base_id,
            name: table.display_name,
            position: table.position,
            created_at: table.created_at.to_jiff(),
            updated_at: table.updated_at.to_jiff(),
        }
    }
}

/// A field of a table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FieldInfo {
    /// Field identifier.
    pub id: Uuid,
    /// The owning table.
    pub table_id: Uuid,
    /// Field name.
    pub name: String,
    /// The field's value type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Type-specific options.
    pub options: serde_json::Value,
    /// Display position within the table.
    pub position: i32,
    /// When the field was created.
    pub created_at: Timestamp,
}

impl From<model::Field> for FieldInfo {
    fn from(field: model::Field) -> Self {
        Self {
            id: field.id,
            table_id: field.table_id,
            name: field.display_name,
            field_type: field.field_type,
            options: field.options,
            position: field.position,
            created_at: field.created_at.to_jiff(),
        }
    }
}

/// A record of a table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RecordInfo {
    /// Record identifier.
    pub id: Uuid,
    /// The owning table.
    pub table_id: Uuid,
    /// Cell values keyed by field id.
    pub values: serde_json::Value,
    /// Optional row colour tag.
    pub row_color: Option<String>,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record was last updated.
    pub updated_at: Timestamp,
}

impl From<model::Record> for RecordInfo {
    fn from(record: model::Record) -> Self {
        Self {
            id: record.id,
            table_id: record.table_id,
            values: record.values,
            row_color: record.row_color,
            created_at: record.created_at.to_jiff(),
            updated_at: record.updated_at.to_jiff(),
        }
    }
}

/// A paginated record listing.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RecordPage {
    /// The page of records.
    pub records: Vec<RecordInfo>,
    /// Total number of records in the table.
    pub total: i64,
}

/// A view of a table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ViewInfo {
    /// View identifier.
    pub id: Uuid,
    /// The owning table.
    pub table_id: Uuid,
    /// View name.
    pub name: String,
    /// Presentation type.
    #[serde(rename = "type")]
    pub view_type: ViewType,
    /// Presentation configuration.
    pub config: serde_json::Value,
    /// Whether the view is published.
    pub is_public: bool,
    /// The public token, present once published.
    pub public_token: Option<String>,
    /// When the view was created.
    pub created_at: Timestamp,
}

impl From<model::View> for ViewInfo {
    fn from(view: model::View) -> Self {
        Self {
            id: view.id,
            table_id: view.table_id,
            name: view.display_name,
            view_type: view.view_type,
            config: view.config,
            is_public: view.is_public,
            public_token: view.public_token,
            created_at: view.created_at.to_jiff(),
        }
    }
}

/// A form over a table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FormInfo {
    /// Form identifier.
    pub id: Uuid,
    /// The owning table.
    pub table_id: Uuid,
    /// Form name.
    pub name: String,
    /// Whether the form accepts submissions.
    pub is_active: bool,
    /// The form's public token.
    pub public_token: String,
    /// Per-field presentation settings.
    pub fields: serde_json::Value,
    /// When the form was created.
    pub created_at: Timestamp,
}

impl From<model::Form> for FormInfo {
    fn from(form: model::Form) -> Self {
        Self {
            id: form.id,
            table_id: form.table_id,
            name: form.display_name,
            is_active: form.is_active,
            public_token: form.public_token,
            fields: form.form_fields,
            created_at: form.created_at.to_jiff(),
        }
    }
}

/// The public projection of a published view.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PublicViewInfo {
    /// View name.
    pub name: String,
    /// Presentation type.
    #[serde(rename = "type")]
    pub view_type: ViewType,
    /// Presentation configuration.
    pub config: serde_json::Value,
    /// The table's fields, in display order.
    pub fields: Vec<FieldInfo>,
    /// The table's records.
    pub records: Vec<RecordInfo>,
}

/// The public projection of an active form.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PublicFormInfo {
    /// Form name.
    pub name: String,
    /// Whether the form accepts submissions.
    pub is_active: bool,
    /// The renderable form fields joined with their field definitions.
    pub fields: serde_json::Value,
}

/// A successful public form submission.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SubmissionResponse {
    /// The created record.
    pub record_id: Uuid,
}

/// A comment on a record.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CommentInfo {
    /// Comment identifier.
    pub id: Uuid,
    /// The record the comment is attached to.
    pub record_id: Uuid,
    /// The authoring account.
    pub author_id: Uuid,
    /// Comment body.
    pub content: String,
    /// Parent comment for threaded replies.
    pub parent_id: Option<Uuid>,
    /// Whether the thread is resolved.
    pub is_resolved: bool,
    /// When the comment was created.
    pub created_at: Timestamp,
    /// When the comment was last edited.
    pub updated_at: Timestamp,
}

impl From<model::Comment> for CommentInfo {
    fn from(comment: model::Comment) -> Self {
        Self {
            id: comment.id,
            record_id: comment.record_id,
            author_id: comment.author_id,
            content: comment.content,
            parent_id: comment.parent_id,
            is_resolved: comment.is_resolved,
            created_at: comment.created_at.to_jiff(),
            updated_at: comment.updated_at.to_jiff(),
        }
    }
}

/// An activity journal entry.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ActivityInfo {
    /// Entry identifier.
    pub id: Uuid,
    /// The base where the change occurred.
    pub base_id: Uuid,
    /// The affected table.
    pub table_id: Option<Uuid>,
    /// The affected record.
    pub record_id: Option<Uuid>,
    /// The acting account.
    pub user_id: Option<Uuid>,
    /// The performed action.
    pub action: ActivityAction,
    /// The kind of entity acted upon.
    pub entity: EntityKind,
    /// Snapshot of the change.
    pub changes: serde_json::Value,
    /// When the change occurred.
    pub created_at: Timestamp,
}

impl From<model::Activity> for ActivityInfo {
    fn from(activity: model::Activity) -> Self {
        Self {
            id: activity.id,
            base_id: activity.base_id,
            table_id: activity.table_id,
            record_id: activity.record_id,
            user_id: activity.user_id,
            action: activity.action,
            entity: activity.entity,
            changes: activity.changes,
            created_at: activity.created_at.to_jiff(),
        }
    }
}

/// A webhook registration, secret omitted.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WebhookInfo {
    /// Webhook identifier.
    pub id: Uuid,
    /// The observed base.
    pub base_id: Uuid,
    /// Webhook name.
    pub name: String,
    /// Endpoint URL.
    pub url: String,
    /// Subscribed event types.
    pub events: Vec<EventType>,
    /// Whether a signing secret is configured.
    pub has_secret: bool,
    /// Whether the webhook receives deliveries.
    pub is_active: bool,
    /// When the webhook was created.
    pub created_at: Timestamp,
}

impl From<model::Webhook> for WebhookInfo {
    fn from(webhook: model::Webhook) -> Self {
        Self {
            id: webhook.id,
            base_id: webhook.base_id,
            name: webhook.display_name,
            url: webhook.url,
            events: webhook.events.into_iter().flatten().collect(),
            has_secret: webhook.secret.is_some(),
            is_active: webhook.is_active,
            created_at: webhook.created_at.to_jiff(),
        }
    }
}

/// One recorded delivery attempt.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DeliveryInfo {
    /// Delivery identifier.
    pub id: Uuid,
    /// The webhook delivered to.
    pub webhook_id: Uuid,
    /// The delivered event type.
    pub event: EventType,
    /// Snapshot of the sent payload.
    pub payload: serde_json::Value,
    /// HTTP status, if a response was received.
    pub response_status: Option<i32>,
    /// Truncated response body.
    pub response_body: Option<String>,
    /// Error description for failures.
    pub error: Option<String>,
    /// HTTP call duration in milliseconds.
    pub duration_ms: i64,
    /// When the attempt was recorded.
    pub created_at: Timestamp,
}

impl From<model::WebhookDelivery> for DeliveryInfo {
    fn from(delivery: model::WebhookDelivery) -> Self {
        Self {
            id: delivery.id,
            webhook_id: delivery.webhook_id,
            event: delivery.event,
            payload: delivery.payload,
            response_status: delivery.response_status,
            response_body: delivery.response_body,
            error: delivery.error,
            duration_ms: delivery.duration_ms,
            created_at: delivery.created_at.to_jiff(),
        }
    }
}

/// An API key, digest never included.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ApiKeyInfo {
    /// Key identifier.
    pub id: Uuid,
    /// Key name.
    pub name: String,
    /// Display prefix of the raw key.
    pub key_prefix: String,
    /// Granted scopes.
    pub scopes: Vec<ApiScope>,
    /// When the key was last used.
    pub last_used_at: Option<Timestamp>,
    /// When the key was created.
    pub created_at: Timestamp,
}

impl From<model::ApiKey> for ApiKeyInfo {
    fn from(key: model::ApiKey) -> Self {
        Self {
            id: key.id,
            name: key.display_name,
            key_prefix: key.key_prefix,
            scopes: key.scopes.into_iter().flatten().collect(),
            last_used_at: key.last_used_at.map(|t| t.to_jiff()),
            created_at: key.created_at.to_jiff(),
        }
    }
}

/// An API key at creation time; the raw key appears exactly once.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ApiKeyWithSecret {
    /// The key metadata.
    #[serde(flatten)]
    pub info: ApiKeyInfo,
    /// The raw key; never retrievable again.
    pub key: String,
}

/// An automation on a table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AutomationInfo {
    /// Automation identifier.
    pub id: Uuid,
    /// The watched table.
    pub table_id: Uuid,
    /// Automation name.
    pub name: String,
    /// Whether the engine evaluates this automation.
    pub is_enabled: bool,
    /// The trigger condition.
    pub trigger_type: AutomationTriggerType,
    /// Trigger parameters.
    pub trigger_config: serde_json::Value,
    /// The action on match.
    pub action_type: AutomationActionType,
    /// Action parameters.
    pub action_config: serde_json::Value,
    /// When the automation was created.
    pub created_at: Timestamp,
}

impl From<model::Automation> for AutomationInfo {
    fn from(automation: model::Automation) -> Self {
        Self {
            id: automation.id,
            table_id: automation.table_id,
            name: automation.display_name,
            is_enabled: automation.is_enabled,
            trigger_type: automation.trigger_type,
            trigger_config: automation.trigger_config,
            action_type: automation.action_type,
            action_config: automation.action_config,
            created_at: automation.created_at.to_jiff(),
        }
    }
}

/// One automation run.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RunInfo {
    /// Run identifier.
    pub id: Uuid,
    /// The automation that ran.
    pub automation_id: Uuid,
    /// Lifecycle status.
    pub status: RunStatus,
    /// Error description for failed runs.
    pub error: Option<String>,
    /// Structured execution log.
    pub log: serde_json::Value,
    /// When the run started.
    pub started_at: Timestamp,
    /// When the run reached a terminal status.
    pub completed_at: Option<Timestamp>,
}

impl From<model::AutomationRun> for RunInfo {
    fn from(run: model::AutomationRun) -> Self {
        Self {
            id: run.id,
            automation_id: run.automation_id,
            status: run.run_status,
            error: run.error,
            log: run.run_log,
            started_at: run.started_at.to_jiff(),
            completed_at: run.completed_at.map(|t| t.to_jiff()),
        }
    }
}

/// Attachment metadata.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AttachmentInfo {
    /// Attachment identifier.
    pub id: Uuid,
    /// The owning record.
    pub record_id: Uuid,
    /// The attachment field.
    pub field_id: Uuid,
    /// Original file name.
    pub filename: String,
    /// MIME content type.
    pub content_type: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// The uploading account.
    pub uploader_id: Uuid,
    /// When the file was uploaded.
    pub created_at: Timestamp,
}

impl From<model::Attachment> for AttachmentInfo {
    fn from(attachment: model::Attachment) -> Self {
        Self {
            id: attachment.id,
            record_id: attachment.record_id,
            field_id: attachment.field_id,
            filename: attachment.filename,
            content_type: attachment.content_type,
            size_bytes: attachment.size_bytes,
            uploader_id: attachment.uploader_id,
            created_at: attachment.created_at.to_jiff(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_info_never_leaks_the_secret() {
        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        let webhook = model::Webhook {
            id: Uuid::new_v4(),
            base_id: Uuid::new_v4(),
            display_name: "sink".to_string(),
            url: "https://sink.example.com".to_string(),
            events: vec![Some(EventType::RecordCreated)],
            secret: Some("hunter2".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let info = WebhookInfo::from(webhook);
        let json = serde_json::to_string(&info).unwrap();

        assert!(info.has_secret);
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn session_info_never_leaks_the_digest() {
        let now = jiff_diesel::Timestamp::from(Timestamp::now());
        let session = model::Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_digest: vec![0xAB; 32],
            ip_address: None,
            user_agent: Some("tests".to_string()),
            issued_at: now,
            expires_at: now,
            last_seen_at: None,
        };

        let json = serde_json::to_value(SessionInfo::from(session)).unwrap();
        assert!(json.get("token_digest").is_none());
    }
}
