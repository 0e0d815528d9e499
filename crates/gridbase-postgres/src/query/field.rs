//! Field repository for table column management.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{Field, NewField, UpdateField};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for field database operations.
pub trait FieldRepository {
    /// Creates a new field.
    fn create_field(
        &mut self,
        new_field: NewField,
    ) -> impl Future<Output = PgResult<Field>> + Send;

    /// Finds a field by ID.
    fn find_field_by_id(
        &mut self,
        field_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Field>>> + Send;

    /// Lists a table's fields in display order.
    fn list_fields_for_table(
        &mut self,
        table_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Field>>> + Send;

    /// Returns the next free position in the table.
    fn next_field_position(
        &mut self,
        table_id: Uuid,
    ) -> impl Future<Output = PgResult<i32>> + Send;

    /// Updates a field.
    fn update_field(
        &mut self,
        field_id: Uuid,
        changes: UpdateField,
    ) -> impl Future<Output = PgResult<Field>> + Send;

    /// Sets one field's position.
    fn set_field_position(
        &mut self,
        field_id: Uuid,
        position: i32,
    ) -> impl Future<Output = PgResult<()>> + Send;

    /// Hard-deletes a field; attachments in the field cascade.
    fn delete_field(&mut self, field_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;
}

impl FieldRepository for PgConnection {
    async fn create_field(&mut self, new_field: NewField) -> PgResult<Field> {
        use schema::fields;

        let field = diesel::insert_into(fields::table)
            .values(&new_field)
            .returning(Field::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(field)
    }

    async fn find_field_by_id(&mut self, target_id: Uuid) -> PgResult<Option<Field>> {
        use schema::fields::dsl::*;

        let field = fields
            .filter(id.eq(target_id))
            .select(Field::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(field)
    }

    async fn list_fields_for_table(&mut self, target_table: Uuid) -> PgResult<Vec<Field>> {
        use schema::fields::dsl::*;

        let rows = fields
            .filter(table_id.eq(target_table))
            .select(Field::as_select())
            .order(position.asc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn next_field_position(&mut self, target_table: Uuid) -> PgResult<i32> {
        use schema::fields::dsl::*;

        let max_position: Option<i32> = fields
            .filter(table_id.eq(target_table))
            .select(diesel::dsl::max(position))
            .first(self)
            .await
            .map_err(PgError::from)?;

        Ok(max_position.map_or(0, |p| p + 1))
    }

    async fn update_field(&mut self, target_id: Uuid, changes: UpdateField) -> PgResult<Field> {
        use schema::fields::dsl::*;

        let field = diesel::update(fields)
            .filter(id.eq(target_id))
            .set(&changes)
            .returning(Field::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(field)
    }

    async fn set_field_position(&mut self, target_id: Uuid, new_position: i32) -> PgResult<()> {
        use schema::fields::dsl::*;

        diesel::update(fields)
            .filter(id.eq(target_id))
            .set(position.eq(new_position))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }

    async fn delete_field(&mut self, target_id: Uuid) -> PgResult<bool> {
        use schema::fields::dsl::*;

        let deleted = diesel::delete(fields)
            .filter(id.eq(target_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
