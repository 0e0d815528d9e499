//! Automation engine worker.
//!
//! Consumes record events from the bus, evaluates the affected table's
//! enabled automations in id order, executes matching actions, and records
//! a run row per match. Action-originated writes re-enter the mutation
//! service under the system identity with an incremented causal depth, so
//! cascades stay bounded and journaled like any other mutation.

use std::sync::Arc;
use std::time::Duration;

use gridbase_events::{BaseEvent, EventBus, EventType};
use gridbase_postgres::PgClient;
use gridbase_postgres::model::{Automation, NewAutomationRun};
use gridbase_postgres::query::{AutomationRepository, AutomationRunRepository};
use gridbase_postgres::types::RunStatus;
use tokio_util::sync::CancellationToken;

use crate::extract::Identity;
use crate::service::automation::{
    ActionConfig, RecordSelector, TriggerConfig, expand_json_template, expand_template,
};
use crate::service::{MAX_CAUSAL_DEPTH, MailMessage, MailerService, MutationService};

/// Tracing target for automation worker operations.
const TRACING_TARGET: &str = "gridbase_server::worker::automation";

/// Idle poll interval of the consume loop.
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for one action execution.
const ACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// The automation engine.
pub struct AutomationWorker {
    pg_client: PgClient,
    bus: EventBus,
    mutations: MutationService,
    mailer: MailerService,
    http: reqwest::Client,
}

impl AutomationWorker {
    /// Creates a new automation worker.
    pub fn new(
        pg_client: PgClient,
        bus: EventBus,
        mutations: MutationService,
        mailer: MailerService,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(ACTION_TIMEOUT)
            .build()
            .expect("failed to create HTTP client");

        Self {
            pg_client,
            bus,
            mutations,
            mailer,
            http,
        }
    }

    /// Runs the worker until cancelled or the bus closes.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(target: TRACING_TARGET, "starting automation worker");

        let mut stream = self.bus.subscribe_all();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(target: TRACING_TARGET, "automation worker shutdown requested");
                    break;
                }
                result = stream.next_with_timeout(POLL_TIMEOUT) => {
                    match result {
                        Ok(Some(event)) => self.handle_event(event).await,
                        Ok(None) => continue,
                        Err(_closed) => {
                            tracing::info!(target: TRACING_TARGET, "event bus closed");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!(target: TRACING_TARGET, "automation worker stopped");
    }

    /// Evaluates one event against its table's automations.
    ///
    /// Runs for one event execute sequentially in automation id order.
    async fn handle_event(&self, event: Arc<BaseEvent>) {
        // Only record events drive triggers.
        if !matches!(
            event.event,
            EventType::RecordCreated | EventType::RecordUpdated | EventType::RecordDeleted
        ) {
            return;
        }
        let Some(table_id) = event.table_id else {
            return;
        };

        let automations = {
            let mut conn = match self.pg_client.get_connection().await {
                Ok(conn) => conn,
                Err(err) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %err,
                        "failed to acquire connection for automation lookup"
                    );
                    return;
                }
            };

            match conn.list_enabled_automations_for_table(table_id).await {
                Ok(automations) => automations,
                Err(err) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        error = %err,
                        table_id = %table_id,
                        "failed to list automations"
                    );
                    return;
                }
            }
        };

        for automation in automations {
            self.evaluate(&automation, &event).await;
        }
    }

    /// Evaluates one automation against one event.
    async fn evaluate(&self, automation: &Automation, event: &BaseEvent) {
        let trigger = match TriggerConfig::parse(automation.trigger_type, &automation.trigger_config)
        {
            Ok(trigger) => trigger,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    automation_id = %automation.id,
                    error = %err,
                    "automation has malformed trigger config, skipping"
                );
                return;
            }
        };

        if !trigger.matches(event) {
            return;
        }

        let Ok(mut conn) = self.pg_client.get_connection().await else {
            tracing::error!(
                target: TRACING_TARGET,
                automation_id = %automation.id,
                "failed to acquire connection for run allocation"
            );
            return;
        };

        let run = match conn
            .create_automation_run(NewAutomationRun {
                automation_id: automation.id,
                run_status: RunStatus::Running,
                run_log: serde_json::json!({ "event": event.event }),
            })
            .await
        {
            Ok(run) => run,
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    automation_id = %automation.id,
                    error = %err,
                    "failed to allocate automation run"
                );
                return;
            }
        };

        // Causal-depth cap: the trigger matched, but executing would push
        // the chain past the cap, so the run is recorded and skipped. A
        // runaway create-record loop therefore produces at most
        // MAX_CAUSAL_DEPTH run rows, the skipped one included.
        if event.causal_depth + 1 >= MAX_CAUSAL_DEPTH {
            let _ = conn
                .complete_automation_run(
                    run.id,
                    RunStatus::Skipped,
                    Some("max depth".to_string()),
                    serde_json::json!({ "causal_depth": event.causal_depth }),
                )
                .await;
            tracing::warn!(
                target: TRACING_TARGET,
                automation_id = %automation.id,
                causal_depth = event.causal_depth,
                "automation cascade reached depth cap, run skipped"
            );
            return;
        }

        let outcome = tokio::time::timeout(
            ACTION_TIMEOUT,
            self.execute_action(automation, event),
        )
        .await;

        let (status, error, log) = match outcome {
            Ok(Ok(log)) => (RunStatus::Success, None, log),
            Ok(Err(reason)) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    automation_id = %automation.id,
                    run_id = %run.id,
                    error = %reason,
                    "automation action failed"
                );
                (
                    RunStatus::Failed,
                    Some(reason.clone()),
                    serde_json::json!({ "error": reason }),
                )
            }
            Err(_elapsed) => (
                RunStatus::Failed,
                Some("action timed out".to_string()),
                serde_json::json!({ "timeout_secs": ACTION_TIMEOUT.as_secs() }),
            ),
        };

        if let Err(err) = conn
            .complete_automation_run(run.id, status, error, log)
            .await
        {
            tracing::error!(
                target: TRACING_TARGET,
                run_id = %run.id,
                error = %err,
                "failed to complete automation run"
            );
        }
    }

    /// Executes an automation's action, returning its run log.
    async fn execute_action(
        &self,
        automation: &Automation,
        event: &BaseEvent,
    ) -> Result<serde_json::Value, String> {
        let action = ActionConfig::parse(automation.action_type, &automation.action_config)
            .map_err(|e| e.to_string())?;

        // Action-originated mutations carry the next causal depth.
        let actor = Identity::system(event.causal_depth + 1);

        match action {
            ActionConfig::SendEmail(config) => {
                let message = MailMessage {
                    to: expand_template(&config.to, event),
                    subject: expand_template(&config.subject, event),
                    body: expand_template(&config.body, event),
                };
                self.mailer.send(&message).await.map_err(|e| e.to_string())?;

                Ok(serde_json::json!({
                    "action": "send_email",
                    "to": message.to,
                    "subject": message.subject,
                }))
            }
            ActionConfig::CreateRecord(config) => {
                let values = match expand_json_template(
                    &serde_json::Value::Object(config.values.clone()),
                    event,
                ) {
                    serde_json::Value::Object(values) => values,
                    _ => serde_json::Map::new(),
                };

                let record = self
                    .mutations
                    .create_record(&actor, config.table_id, values)
                    .await
                    .map_err(|e| e.to_string())?;

                Ok(serde_json::json!({
                    "action": "create_record",
                    "table_id": config.table_id,
                    "record_id": record.id,
                }))
            }
            ActionConfig::UpdateRecord(config) => {
                let target = match config.target {
                    RecordSelector::Trigger => event
                        .entity_id
                        .ok_or_else(|| "event carries no record".to_string())?,
                    RecordSelector::Record(record_id) => record_id,
                };

                let values = match expand_json_template(
                    &serde_json::Value::Object(config.values.clone()),
                    event,
                ) {
                    serde_json::Value::Object(values) => values,
                    _ => serde_json::Map::new(),
                };

                let record = self
                    .mutations
                    .patch_record(&actor, target, values)
                    .await
                    .map_err(|e| e.to_string())?;

                Ok(serde_json::json!({
                    "action": "update_record",
                    "record_id": record.id,
                }))
            }
            ActionConfig::Webhook(config) => {
                let method = reqwest::Method::from_bytes(config.method.as_bytes())
                    .map_err(|_| format!("invalid method `{}`", config.method))?;
                let body = expand_json_template(&config.body, event);

                let mut request = self.http.request(method, &config.url).json(&body);
                for (name, value) in &config.headers {
                    request = request.header(name, expand_template(value, event));
                }

                let response = request.send().await.map_err(|e| e.to_string())?;
                let status = response.status();
                if !status.is_success() {
                    return Err(format!("non-success status code: {}", status.as_u16()));
                }

                Ok(serde_json::json!({
                    "action": "webhook",
                    "url": config.url,
                    "status": status.as_u16(),
                }))
            }
        }
    }

    /// Returns the record a selector ultimately targets.
    ///
    /// Exposed for tests; the engine itself resolves lazily.
    #[cfg(test)]
    fn target_of(config: &RecordSelector, event: &BaseEvent) -> Option<uuid::Uuid> {
        match config {
            RecordSelector::Trigger => event.entity_id,
            RecordSelector::Record(record_id) => Some(*record_id),
        }
    }
}

impl std::fmt::Debug for AutomationWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationWorker").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn trigger_selector_resolves_event_record() {
        let record_id = Uuid::new_v4();
        let event = BaseEvent::new(EventType::RecordCreated, Uuid::new_v4())
            .with_entity(record_id);

        assert_eq!(
            AutomationWorker::target_of(&RecordSelector::Trigger, &event),
            Some(record_id)
        );

        let explicit = Uuid::new_v4();
        assert_eq!(
            AutomationWorker::target_of(&RecordSelector::Record(explicit), &event),
            Some(explicit)
        );
    }
}
