//! Form repository for public submission forms.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{Form, NewForm, UpdateForm};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for form database operations.
pub trait FormRepository {
    /// Creates a new form.
    fn create_form(&mut self, new_form: NewForm) -> impl Future<Output = PgResult<Form>> + Send;

    /// Finds a form by ID.
    fn find_form_by_id(
        &mut self,
        form_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Form>>> + Send;

    /// Finds a form by its public token, active or not.
    ///
    /// Inactive forms are still resolvable so submissions can surface a
    /// distinct `form_inactive` error instead of `not_found`.
    fn find_form_by_public_token(
        &mut self,
        token: &str,
    ) -> impl Future<Output = PgResult<Option<Form>>> + Send;

    /// Lists a table's forms, oldest first.
    fn list_forms_for_table(
        &mut self,
        table_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Form>>> + Send;

    /// Updates a form.
    fn update_form(
        &mut self,
        form_id: Uuid,
        changes: UpdateForm,
    ) -> impl Future<Output = PgResult<Form>> + Send;

    /// Hard-deletes a form.
    fn delete_form(&mut self, form_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;
}

impl FormRepository for PgConnection {
    async fn create_form(&mut self, new_form: NewForm) -> PgResult<Form> {
        use schema::forms;

        let form = diesel::insert_into(forms::table)
            .values(&new_form)
            .returning(Form::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(form)
    }

    async fn find_form_by_id(&mut self, target_id: Uuid) -> PgResult<Option<Form>> {
        use schema::forms::dsl::*;

        let form = forms
            .filter(id.eq(target_id))
            .select(Form::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(form)
    }

    async fn find_form_by_public_token(&mut self, token: &str) -> PgResult<Option<Form>> {
        use schema::forms::dsl::*;

        let form = forms
            .filter(public_token.eq(token))
            .select(Form::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(form)
    }

    async fn list_forms_for_table(&mut self, target_table: Uuid) -> PgResult<Vec<Form>> {
        use schema::forms::dsl::*;

        let rows = forms
            .filter(table_id.eq(target_table))
            .select(Form::as_select())
            .order(created_at.asc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn update_form(&mut self, target_id: Uuid, changes: UpdateForm) -> PgResult<Form> {
        use schema::forms::dsl::*;

        let form = diesel::update(forms)
            .filter(id.eq(target_id))
            .set(&changes)
            .returning(Form::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(form)
    }

    async fn delete_form(&mut self, target_id: Uuid) -> PgResult<bool> {
        use schema::forms::dsl::*;

        let deleted = diesel::delete(forms)
            .filter(id.eq(target_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
