//! Automation trigger and action configurations.
//!
//! Trigger and action parameters persist as opaque JSON on the automation
//! row; this module is the typed view plus the matching and template
//! machinery the engine runs against each event.

use std::collections::HashMap;
use std::sync::LazyLock;

use gridbase_events::BaseEvent;
use gridbase_postgres::types::{AutomationActionType, AutomationTriggerType, EventType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Matches `{{record.<field_id>}}` references inside templated strings.
static TEMPLATE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*record\.([0-9a-fA-F-]{36})\s*\}\}").expect("template regex is valid")
});

/// Error produced when a trigger or action configuration fails validation.
#[derive(Debug, thiserror::Error)]
#[error("invalid automation config: {0}")]
pub struct AutomationConfigError(pub String);

/// Comparison operator for `record_matches` triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

impl MatchOperator {
    /// Applies the operator to a cell value.
    pub fn evaluate(self, cell: Option<&serde_json::Value>, expected: &serde_json::Value) -> bool {
        let is_empty = match cell {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::String(s)) => s.is_empty(),
            Some(serde_json::Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        };

        match self {
            Self::IsEmpty => is_empty,
            Self::IsNotEmpty => !is_empty,
            Self::Equals => cell == Some(expected),
            Self::NotEquals => cell != Some(expected),
            Self::Contains => match (cell, expected.as_str()) {
                (Some(serde_json::Value::String(text)), Some(needle)) => text.contains(needle),
                (Some(serde_json::Value::Array(items)), _) => items.contains(expected),
                _ => false,
            },
            Self::GreaterThan => match (cell.and_then(|v| v.as_f64()), expected.as_f64()) {
                (Some(actual), Some(bound)) => actual > bound,
                _ => false,
            },
            Self::LessThan => match (cell.and_then(|v| v.as_f64()), expected.as_f64()) {
                (Some(actual), Some(bound)) => actual < bound,
                _ => false,
            },
        }
    }
}

/// Parameters for `record_updated` triggers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordUpdatedConfig {
    /// When set, the trigger fires only if this field's value changed.
    #[serde(default)]
    pub field_id: Option<Uuid>,
}

/// Parameters for `record_matches` triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMatchesConfig {
    /// The field whose value is tested.
    pub field_id: Uuid,
    /// The comparison operator.
    pub operator: MatchOperator,
    /// The comparison operand; ignored by the emptiness operators.
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Typed view of an automation's trigger configuration.
#[derive(Debug, Clone)]
pub enum TriggerConfig {
    /// Fires once per new record.
    RecordCreated,
    /// Fires when a record changes, optionally scoped to one field.
    RecordUpdated(RecordUpdatedConfig),
    /// Fires when a field value satisfies an operator after a change.
    RecordMatches(RecordMatchesConfig),
}

impl TriggerConfig {
    /// Validates and decodes trigger configuration for its type.
    pub fn parse(
        trigger_type: AutomationTriggerType,
        raw: &serde_json::Value,
    ) -> Result<Self, AutomationConfigError> {
        match trigger_type {
            AutomationTriggerType::RecordCreated => Ok(Self::RecordCreated),
            AutomationTriggerType::RecordUpdated => {
                let config = serde_json::from_value(raw.clone())
                    .map_err(|e| AutomationConfigError(e.to_string()))?;
                Ok(Self::RecordUpdated(config))
            }
            AutomationTriggerType::RecordMatches => {
                let config = serde_json::from_value(raw.clone())
                    .map_err(|e| AutomationConfigError(e.to_string()))?;
                Ok(Self::RecordMatches(config))
            }
        }
    }

    /// Returns whether this trigger matches the given event.
    pub fn matches(&self, event: &BaseEvent) -> bool {
        match self {
            Self::RecordCreated => event.event == EventType::RecordCreated,
            Self::RecordUpdated(config) => {
                if event.event != EventType::RecordUpdated {
                    return false;
                }
                match config.field_id {
                    None => true,
                    Some(field_id) => field_changed(event, field_id),
                }
            }
            Self::RecordMatches(config) => {
                if !matches!(
                    event.event,
                    EventType::RecordCreated | EventType::RecordUpdated
                ) {
                    return false;
                }
                let cell = event_cell(event, config.field_id);
                config.operator.evaluate(cell, &config.value)
            }
        }
    }
}

/// Parameters for the `send_email` action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailConfig {
    /// Recipient address; may be templated.
    pub to: String,
    /// Subject line; may be templated.
    pub subject: String,
    /// Message body; may be templated.
    pub body: String,
}

/// Parameters for the `create_record` action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordConfig {
    /// The table the new record is created in.
    pub table_id: Uuid,
    /// Cell values keyed by field id; string values may be templated.
    pub values: serde_json::Map<String, serde_json::Value>,
}

/// Record selector for the `update_record` action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSelector {
    /// The record that triggered the automation.
    #[default]
    Trigger,
    /// A specific record by id.
    Record(Uuid),
}

/// Parameters for the `update_record` action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRecordConfig {
    /// Which record to patch.
    #[serde(default)]
    pub target: RecordSelector,
    /// Patch values keyed by field id; string values may be templated.
    pub values: serde_json::Map<String, serde_json::Value>,
}

/// Parameters for the `webhook` action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookActionConfig {
    /// The URL to call.
    pub url: String,
    /// HTTP method; defaults to POST.
    #[serde(default = "default_method")]
    pub method: String,
    /// Extra request headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Request body; string leaves may be templated.
    #[serde(default)]
    pub body: serde_json::Value,
}

fn default_method() -> String {
    "POST".to_string()
}

/// Typed view of an automation's action configuration.
#[derive(Debug, Clone)]
pub enum ActionConfig {
    SendEmail(SendEmailConfig),
    CreateRecord(CreateRecordConfig),
    UpdateRecord(UpdateRecordConfig),
    Webhook(WebhookActionConfig),
}

impl ActionConfig {
    /// Validates and decodes action configuration for its type.
    pub fn parse(
        action_type: AutomationActionType,
        raw: &serde_json::Value,
    ) -> Result<Self, AutomationConfigError> {
        let decode_err = |e: serde_json::Error| AutomationConfigError(e.to_string());

        match action_type {
            AutomationActionType::SendEmail => {
                Ok(Self::SendEmail(serde_json::from_value(raw.clone()).map_err(decode_err)?))
            }
            AutomationActionType::CreateRecord => Ok(Self::CreateRecord(
                serde_json::from_value(raw.clone()).map_err(decode_err)?,
            )),
            AutomationActionType::UpdateRecord => Ok(Self::UpdateRecord(
                serde_json::from_value(raw.clone()).map_err(decode_err)?,
            )),
            AutomationActionType::Webhook => {
                let config: WebhookActionConfig =
                    serde_json::from_value(raw.clone()).map_err(decode_err)?;
                url::Url::parse(&config.url)
                    .map_err(|e| AutomationConfigError(format!("invalid URL: {e}")))?;
                Ok(Self::Webhook(config))
            }
        }
    }
}

/// Expands `{{record.<field_id>}}` references with values from the event's
/// record snapshot. Missing references render as the empty string.
pub fn expand_template(template: &str, event: &BaseEvent) -> String {
    TEMPLATE_REF
        .replace_all(template, |captures: &regex::Captures<'_>| {
            let Ok(field_id) = Uuid::parse_str(&captures[1]) else {
                return String::new();
            };
            match event_cell(event, field_id) {
                Some(serde_json::Value::String(text)) => text.clone(),
                Some(serde_json::Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }
        })
        .into_owned()
}

/// Expands string leaves of a JSON template against the event.
pub fn expand_json_template(value: &serde_json::Value, event: &BaseEvent) -> serde_json::Value {
    match value {
        serde_json::Value::String(text) => {
            serde_json::Value::String(expand_template(text, event))
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(
            items.iter().map(|item| expand_json_template(item, event)).collect(),
        ),
        serde_json::Value::Object(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(key, entry)| (key.clone(), expand_json_template(entry, event)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Reads a field's post-change cell value from the event snapshot.
fn event_cell(event: &BaseEvent, field_id: Uuid) -> Option<&serde_json::Value> {
    event
        .record
        .as_ref()?
        .get("values")?
        .get(field_id.to_string())
}

/// Returns whether a field's value differs between old and new snapshots.
fn field_changed(event: &BaseEvent, field_id: Uuid) -> bool {
    let key = field_id.to_string();
    let new_value = event
        .record
        .as_ref()
        .and_then(|r| r.get("values"))
        .and_then(|v| v.get(&key));
    let old_value = event
        .old_record
        .as_ref()
        .and_then(|r| r.get("values"))
        .and_then(|v| v.get(&key));

    new_value != old_value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_event(
        field_id: Uuid,
        old: serde_json::Value,
        new: serde_json::Value,
    ) -> BaseEvent {
        BaseEvent::new(EventType::RecordUpdated, Uuid::new_v4())
            .with_record(serde_json::json!({"values": {field_id.to_string(): new}}))
            .with_old_record(serde_json::json!({"values": {field_id.to_string(): old}}))
    }

    #[test]
    fn record_updated_scoped_to_field() {
        let watched = Uuid::new_v4();
        let trigger = TriggerConfig::RecordUpdated(RecordUpdatedConfig {
            field_id: Some(watched),
        });

        let changed = update_event(watched, serde_json::json!(1), serde_json::json!(2));
        assert!(trigger.matches(&changed));

        let unchanged = update_event(watched, serde_json::json!(2), serde_json::json!(2));
        assert!(!trigger.matches(&unchanged));
    }

    #[test]
    fn record_matches_operators() {
        let field_id = Uuid::new_v4();
        let event = update_event(field_id, serde_json::json!(1), serde_json::json!(10));

        let gt = TriggerConfig::RecordMatches(RecordMatchesConfig {
            field_id,
            operator: MatchOperator::GreaterThan,
            value: serde_json::json!(5),
        });
        assert!(gt.matches(&event));

        let eq = TriggerConfig::RecordMatches(RecordMatchesConfig {
            field_id,
            operator: MatchOperator::Equals,
            value: serde_json::json!(3),
        });
        assert!(!eq.matches(&event));
    }

    #[test]
    fn emptiness_operators() {
        assert!(MatchOperator::IsEmpty.evaluate(None, &serde_json::Value::Null));
        assert!(MatchOperator::IsEmpty.evaluate(
            Some(&serde_json::json!("")),
            &serde_json::Value::Null
        ));
        assert!(MatchOperator::IsNotEmpty.evaluate(
            Some(&serde_json::json!("x")),
            &serde_json::Value::Null
        ));
    }

    #[test]
    fn template_expansion() {
        let field_id = Uuid::new_v4();
        let event = BaseEvent::new(EventType::RecordCreated, Uuid::new_v4()).with_record(
            serde_json::json!({"values": {field_id.to_string(): "Ana"}}),
        );

        let expanded =
            expand_template(&format!("Hello {{{{record.{field_id}}}}}!"), &event);
        assert_eq!(expanded, "Hello Ana!");

        let missing = expand_template(
            &format!("[{{{{record.{}}}}}]", Uuid::new_v4()),
            &event,
        );
        assert_eq!(missing, "[]");
    }

    #[test]
    fn json_template_expands_nested_strings() {
        let field_id = Uuid::new_v4();
        let event = BaseEvent::new(EventType::RecordCreated, Uuid::new_v4()).with_record(
            serde_json::json!({"values": {field_id.to_string(): 42}}),
        );

        let template = serde_json::json!({
            "note": format!("value is {{{{record.{field_id}}}}}"),
            "count": 1,
        });
        let expanded = expand_json_template(&template, &event);
        assert_eq!(expanded["note"], "value is 42");
        assert_eq!(expanded["count"], 1);
    }

    #[test]
    fn trigger_config_rejects_malformed_json() {
        let raw = serde_json::json!({"field_id": "not-a-uuid"});
        assert!(TriggerConfig::parse(AutomationTriggerType::RecordUpdated, &raw).is_err());
        assert!(TriggerConfig::parse(AutomationTriggerType::RecordCreated, &raw).is_ok());
    }

    #[test]
    fn action_config_validates_webhook_url() {
        let raw = serde_json::json!({"url": "not a url"});
        assert!(ActionConfig::parse(AutomationActionType::Webhook, &raw).is_err());

        let raw = serde_json::json!({"url": "https://example.com/hook"});
        assert!(ActionConfig::parse(AutomationActionType::Webhook, &raw).is_ok());
    }
}
