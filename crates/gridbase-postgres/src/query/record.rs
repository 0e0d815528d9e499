//! Record repository for row-level data operations.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::Pagination;
use crate::model::{NewRecord, Record};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for record database operations.
///
/// The `*_for_user` methods verify collaborator membership inside the query
/// itself, so a compromised handler cannot leak rows from bases the acting
/// user is not a member of.
pub trait RecordRepository {
    /// Creates a new record.
    fn create_record(
        &mut self,
        new_record: NewRecord,
    ) -> impl Future<Output = PgResult<Record>> + Send;

    /// Creates records in bulk; the returned order matches the input order.
    fn create_records(
        &mut self,
        new_records: Vec<NewRecord>,
    ) -> impl Future<Output = PgResult<Vec<Record>>> + Send;

    /// Finds a record by ID without an access check.
    ///
    /// Reserved for internal paths (automation engine, cascade cleanup)
    /// that operate under a system identity.
    fn find_record_by_id(
        &mut self,
        record_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Record>>> + Send;

    /// Finds a record by ID, verifying the acting user is a collaborator on
    /// the record's base.
    fn find_record_for_user(
        &mut self,
        record_id: Uuid,
        acting_user: Uuid,
    ) -> impl Future<Output = PgResult<Option<Record>>> + Send;

    /// Lists a table's records in creation order.
    fn list_records_for_table(
        &mut self,
        table_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<Record>>> + Send;

    /// Loads specific records by ID.
    fn list_records_by_ids(
        &mut self,
        record_ids: &[Uuid],
    ) -> impl Future<Output = PgResult<Vec<Record>>> + Send;

    /// Counts a table's records.
    fn count_records_for_table(
        &mut self,
        table_id: Uuid,
    ) -> impl Future<Output = PgResult<i64>> + Send;

    /// Replaces a record's cell values.
    fn set_record_values(
        &mut self,
        record_id: Uuid,
        values: serde_json::Value,
    ) -> impl Future<Output = PgResult<Record>> + Send;

    /// Sets or clears a record's row colour.
    fn set_record_color(
        &mut self,
        record_id: Uuid,
        color: Option<String>,
    ) -> impl Future<Output = PgResult<Record>> + Send;

    /// Hard-deletes a record; comments and attachments cascade.
    fn delete_record(&mut self, record_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;
}

impl RecordRepository for PgConnection {
    async fn create_record(&mut self, new_record: NewRecord) -> PgResult<Record> {
        use schema::records;

        let record = diesel::insert_into(records::table)
            .values(&new_record)
            .returning(Record::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(record)
    }

    async fn create_records(&mut self, new_records: Vec<NewRecord>) -> PgResult<Vec<Record>> {
        use schema::records;

        let rows = diesel::insert_into(records::table)
            .values(&new_records)
            .returning(Record::as_returning())
            .get_results(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn find_record_by_id(&mut self, target_id: Uuid) -> PgResult<Option<Record>> {
        use schema::records::dsl::*;

        let record = records
            .filter(id.eq(target_id))
            .select(Record::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(record)
    }

    async fn find_record_for_user(
        &mut self,
        target_id: Uuid,
        acting_user: Uuid,
    ) -> PgResult<Option<Record>> {
        use schema::{base_collaborators, records, tables};

        let record = records::table
            .inner_join(
                tables::table.inner_join(
                    base_collaborators::table
                        .on(base_collaborators::base_id.eq(tables::base_id)),
                ),
            )
            .filter(records::id.eq(target_id))
            .filter(base_collaborators::user_id.eq(acting_user))
            .select(Record::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(record)
    }

    async fn list_records_for_table(
        &mut self,
        target_table: Uuid,
        pagination: Pagination,
    ) -> PgResult<Vec<Record>> {
        use schema::records::dsl::*;

        let rows = records
            .filter(table_id.eq(target_table))
            .select(Record::as_select())
            .order(created_at.asc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn list_records_by_ids(&mut self, record_ids: &[Uuid]) -> PgResult<Vec<Record>> {
        use schema::records::dsl::*;

        let rows = records
            .filter(id.eq_any(record_ids))
            .select(Record::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn count_records_for_table(&mut self, target_table: Uuid) -> PgResult<i64> {
        use schema::records::dsl::*;

        let count = records
            .filter(table_id.eq(target_table))
            .count()
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(count)
    }

    async fn set_record_values(
        &mut self,
        target_id: Uuid,
        new_values: serde_json::Value,
    ) -> PgResult<Record> {
        use schema::records::dsl::*;

        let now = jiff_diesel::Timestamp::from(jiff::Timestamp::now());
        let record = diesel::update(records)
            .filter(id.eq(target_id))
            .set((values.eq(new_values), updated_at.eq(now)))
            .returning(Record::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(record)
    }

    async fn set_record_color(
        &mut self,
        target_id: Uuid,
        color: Option<String>,
    ) -> PgResult<Record> {
        use schema::records::dsl::*;

        let now = jiff_diesel::Timestamp::from(jiff::Timestamp::now());
        let record = diesel::update(records)
            .filter(id.eq(target_id))
            .set((row_color.eq(color), updated_at.eq(now)))
            .returning(Record::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(record)
    }

    async fn delete_record(&mut self, target_id: Uuid) -> PgResult<bool> {
        use schema::records::dsl::*;

        let deleted = diesel::delete(records)
            .filter(id.eq(target_id))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(deleted > 0)
    }
}
