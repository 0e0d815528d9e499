//! Table repository for schema management within a base.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewTable, Table, UpdateTable};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for table database operations.
///
/// Positions within a base form a permutation; the service layer validates
/// reorder input covers the current set before rewriting positions inside a
/// transaction.
pub trait TableRepository {
    /// Creates a new table.
    fn create_table(
        &mut self,
        new_table: NewTable,
    ) -> impl Future<Output = PgResult<Table>> + Send;

    /// Finds a table by ID.
    fn find_table_by_id(
        &mut self,
        table_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Table>>> + Send;

    /// Lists a base's tables in display order.
    fn list_tables_for_base(
        &mut self,
        base_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Table>>> + Send;

    /// Returns the next free position in the base.
    fn next_table_position(
        &mut self,
        base_id: Uuid,
    ) -> impl Future<Output = PgResult<i32>> + Send;

    /// Updates a table.
    fn update_table(
        &mut self,
        table_id: Uuid,
        changes: UpdateTable,
    ) -> impl Future<Output = PgResult<Table>> + Send;

    /// Sets one table's position.
    fn set_table_position(
        &mut self,
        table_id: Uuid,
        position: i32,
    ) -> impl Future<Output = PgResult<()>> + Send;

    /// Hard-deletes a table; child rows cascade in the database.
    fn delete_table(&mut self, table_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;
}

impl TableRepository for PgConnection {
    async fn create_table(&mut self, new_table: NewTable) -> PgResult<Table> {
        use schema::tables;

        let table = diesel::insert_into(tables::table)
            .values(&new_table)
            .returning(Table::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(table)
    }

    async fn find_table_by_id(&mut self, target_id: Uuid) -> PgResult<Option<Table>> {
        use schema::tables::dsl::*;

        let table = tables
            .filter(id.eq(target_id))
            .select(Table::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(table)
    }

    async fn list_tables_for_base(&mut self, target_base: Uuid) -> PgResult<Vec<Table>> {
        use schema::tables::dsl::*;

        let rows = tables
            .filter(base_id.eq(target_base))
            .select(Table::as_select())
            .order(position.asc())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn next_table_position(&mut self, target_base: Uuid) -> PgResult<i32> {
        use schema::tables::dsl::*;

        let max_position: Option<i32> = tables
            .filter(base_id.eq(target_base))
            .select(diesel::dsl::max(position))
            .first(self)
            .await
            .map_err(PgError::from)?;

        Ok(max_position.map_or(0, |p| p + 1))
    }

    async fn update_table(&mut self, target_id: Uuid, changes: UpdateTable) -> PgResult<Table> {
        use schema::tables::dsl::*;

        let table = diesel::update(tables)
            .filter(id.eq(target_id))
            .set(&changes)
            .returning(Table::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(table)
    }

    async fn set_table_position(&mut self, target_id: Uuid, new_position: i32) -> PgResult<()> {
        use schema::tables::dsl::*;

        diesel::update(tables)
            .filter(id.eq(target_id))
            .set(position.eq(new_position))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }

    async fn delete_table(&mut self, target_id: Uuid) -> PgResult<bool> {
        use schema::tables::dsl::*;

        let deleted = diesel::delete(tables)
            .filter(id.eq(target_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
