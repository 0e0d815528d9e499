//! Form lifecycle operations and public submission.

use diesel_async::scoped_futures::ScopedFutureExt;
use gridbase_events::EventType;
use gridbase_postgres::model::{Form, NewActivity, NewForm, NewRecord, Record, UpdateForm};
use gridbase_postgres::query::{
    ActivityRepository,
    BaseRepository, FieldRepository, FormRepository, RecordRepository, TableRepository,
};
use gridbase_postgres::types::{ActivityAction, CollaboratorRole, EntityKind, FormField};
use uuid::Uuid;

use super::record::validated_values;
use super::{
    InvalidInput, MutationError, MutationResult, MutationService, event_for, record_snapshot,
    require_name,
};
use crate::extract::Identity;
use crate::service::auth::generate_token;

impl MutationService {
    /// Creates a new form over a table.
    ///
    /// The globally-unique public token is assigned at creation; forms are
    /// reachable by token from the moment they exist (and active by
    /// default).
    pub async fn create_form(
        &self,
        actor: &Identity,
        table_id: Uuid,
        name: &str,
        form_fields: Vec<FormField>,
    ) -> MutationResult<Form> {
        let display_name = require_name(name)?;

        let mut conn = self.conn().await?;
        let table = conn
            .find_table_by_id(table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        self.validate_form_fields(&mut conn, table_id, &form_fields)
            .await?;

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let public_token = generate_token().raw;
        let encoded_fields = FormField::encode_list(&form_fields);
        let form = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let form = conn
                        .create_form(NewForm {
                            table_id,
                            display_name,
                            public_token,
                            form_fields: encoded_fields,
                        })
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Create,
                        entity: EntityKind::Form,
                        changes: serde_json::json!({ "name": form.display_name }),
                    })
                    .await?;

                    Ok(form)
                }
                .scope_boxed()
            })
            .await?;

        Ok(form)
    }

    /// Updates a form's name or active flag.
    pub async fn update_form(
        &self,
        actor: &Identity,
        form_id: Uuid,
        name: Option<&str>,
        is_active: Option<bool>,
    ) -> MutationResult<Form> {
        let display_name = name.map(require_name).transpose()?;

        let (mut conn, form, table) = self.load_form_for_edit(actor, form_id).await?;

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = form.table_id;
        let form = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let form = conn
                        .update_form(
                            form_id,
                            UpdateForm {
                                display_name,
                                is_active,
                                form_fields: None,
                            },
                        )
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Form,
                        changes: serde_json::json!({
                            "name": form.display_name,
                            "is_active": form.is_active,
                        }),
                    })
                    .await?;

                    Ok(form)
                }
                .scope_boxed()
            })
            .await?;

        Ok(form)
    }

    /// Replaces a form's field configuration.
    pub async fn update_form_fields(
        &self,
        actor: &Identity,
        form_id: Uuid,
        form_fields: Vec<FormField>,
    ) -> MutationResult<Form> {
        let (mut conn, form, table) = self.load_form_for_edit(actor, form_id).await?;

        self.validate_form_fields(&mut conn, form.table_id, &form_fields)
            .await?;

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = form.table_id;
        let encoded_fields = FormField::encode_list(&form_fields);
        let form = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let form = conn
                        .update_form(
                            form_id,
                            UpdateForm {
                                display_name: None,
                                is_active: None,
                                form_fields: Some(encoded_fields),
                            },
                        )
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: None,
                        user_id: journal_user,
                        action: ActivityAction::Update,
                        entity: EntityKind::Form,
                        changes: serde_json::json!({
                            "name": form.display_name,
                            "fields": form.form_fields,
                        }),
                    })
                    .await?;

                    Ok(form)
                }
                .scope_boxed()
            })
            .await?;

        Ok(form)
    }

    /// Deletes a form.
    pub async fn delete_form(&self, actor: &Identity, form_id: Uuid) -> MutationResult<()> {
        let (mut conn, form, table) = self.load_form_for_edit(actor, form_id).await?;

        let journal_user = actor.journal_user();
        let base_id = table.base_id;
        let table_id = form.table_id;
        let form_name = form.display_name.clone();
        conn.transaction::<_, MutationError, _>(|conn| {
            async move {
                conn.delete_form(form_id).await?;

                conn.append_activity(NewActivity {
                    base_id,
                    table_id: Some(table_id),
                    record_id: None,
                    user_id: journal_user,
                    action: ActivityAction::Delete,
                    entity: EntityKind::Form,
                    changes: serde_json::json!({ "name": form_name }),
                })
                .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        Ok(())
    }

    /// Accepts an unauthenticated submission against a form's public token.
    ///
    /// Validates required flags and field types, creates the record, and
    /// emits `record.created`. The journal attributes the write to the
    /// base owner (the form acts on their behalf); the event carries no
    /// origin user, so every connected client observes it.
    pub async fn submit_public_form(
        &self,
        token: &str,
        values: serde_json::Map<String, serde_json::Value>,
    ) -> MutationResult<Record> {
        let mut conn = self.conn().await?;
        let form = conn
            .find_form_by_public_token(token)
            .await?
            .ok_or(MutationError::NotFound("form"))?;

        if !form.is_active {
            return Err(InvalidInput::FormInactive.into());
        }

        let table = conn
            .find_table_by_id(form.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        let base = conn
            .find_base_by_id(table.base_id)
            .await?
            .ok_or(MutationError::NotFound("base"))?;

        let form_fields = FormField::decode_list(&form.form_fields).ok_or_else(|| {
            MutationError::internal(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "form fields column is malformed",
            ))
        })?;

        // Only fields configured on the form are accepted from the public.
        for key in values.keys() {
            let Ok(field_id) = Uuid::parse_str(key) else {
                return Err(MutationError::invalid(format!(
                    "`{key}` is not a field id"
                )));
            };
            if !form_fields
                .iter()
                .any(|f| f.field_id == field_id && f.visible)
            {
                return Err(MutationError::invalid(format!(
                    "`{key}` is not part of this form"
                )));
            }
        }

        for form_field in form_fields.iter().filter(|f| f.required && f.visible) {
            let present = values
                .get(&form_field.field_id.to_string())
                .is_some_and(|value| !value.is_null() && value != "");
            if !present {
                return Err(MutationError::invalid(format!(
                    "field `{}` is required",
                    form_field.field_id
                )));
            }
        }

        let fields = conn.list_fields_for_table(form.table_id).await?;
        let validated = validated_values(&mut conn, &fields, None, values, true).await?;

        let base_id = table.base_id;
        let table_id = form.table_id;
        let owner_id = base.owner_id;
        let new_values = serde_json::Value::Object(validated);
        let record = conn
            .transaction::<_, MutationError, _>(|conn| {
                async move {
                    let record = conn
                        .create_record(NewRecord {
                            table_id,
                            values: new_values,
                        })
                        .await?;

                    conn.append_activity(NewActivity {
                        base_id,
                        table_id: Some(table_id),
                        record_id: Some(record.id),
                        user_id: Some(owner_id),
                        action: ActivityAction::Create,
                        entity: EntityKind::Record,
                        changes: serde_json::json!({
                            "values": record.values,
                            "via_form": form.id,
                        }),
                    })
                    .await?;

                    Ok(record)
                }
                .scope_boxed()
            })
            .await?;

        self.publish(
            event_for(
                &crate::extract::Identity::system(0),
                EventType::RecordCreated,
                base_id,
            )
            .with_table(table_id)
            .with_entity(record.id)
            .with_record(record_snapshot(&record)),
        );

        Ok(record)
    }

    /// Loads a form plus its table and checks editor rights.
    async fn load_form_for_edit(
        &self,
        actor: &Identity,
        form_id: Uuid,
    ) -> MutationResult<(gridbase_postgres::PgConn, Form, gridbase_postgres::model::Table)>
    {
        let mut conn = self.conn().await?;
        let form = conn
            .find_form_by_id(form_id)
            .await?
            .ok_or(MutationError::NotFound("form"))?;
        let table = conn
            .find_table_by_id(form.table_id)
            .await?
            .ok_or(MutationError::NotFound("table"))?;
        actor
            .require_role(&mut conn, table.base_id, CollaboratorRole::Editor)
            .await?;

        Ok((conn, form, table))
    }

    /// Verifies every configured form field belongs to the table.
    async fn validate_form_fields(
        &self,
        conn: &mut gridbase_postgres::PgConn,
        table_id: Uuid,
        form_fields: &[FormField],
    ) -> MutationResult<()> {
        let fields = conn.list_fields_for_table(table_id).await?;

        for form_field in form_fields {
            let Some(field) = fields.iter().find(|f| f.id == form_field.field_id) else {
                return Err(MutationError::invalid(format!(
                    "`{}` is not a field of this table",
                    form_field.field_id
                )));
            };

            // Computed cells cannot be filled in by submitters.
            if field.field_type.is_computed() {
                return Err(MutationError::invalid(format!(
                    "computed field `{}` cannot appear on a form",
                    form_field.field_id
                )));
            }
        }

        Ok(())
    }
}
