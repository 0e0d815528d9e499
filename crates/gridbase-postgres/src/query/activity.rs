//! Activity journal repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::Pagination;
use crate::model::{Activity, NewActivity};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for the append-only activity journal.
pub trait ActivityRepository {
    /// Appends a journal entry.
    fn append_activity(
        &mut self,
        new_activity: NewActivity,
    ) -> impl Future<Output = PgResult<Activity>> + Send;

    /// Lists a base's journal, newest first.
    fn list_activities_for_base(
        &mut self,
        base_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<Activity>>> + Send;

    /// Lists a record's journal, newest first.
    fn list_activities_for_record(
        &mut self,
        record_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = PgResult<Vec<Activity>>> + Send;
}

impl ActivityRepository for PgConnection {
    async fn append_activity(&mut self, new_activity: NewActivity) -> PgResult<Activity> {
        use schema::activities;

        let activity = diesel::insert_into(activities::table)
            .values(&new_activity)
            .returning(Activity::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(activity)
    }

    async fn list_activities_for_base(
        &mut self,
        target_base: Uuid,
        pagination: Pagination,
    ) -> PgResult<Vec<Activity>> {
        use schema::activities::dsl::*;

        let rows = activities
            .filter(base_id.eq(target_base))
            .select(Activity::as_select())
            .order(created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }

    async fn list_activities_for_record(
        &mut self,
        target_record: Uuid,
        pagination: Pagination,
    ) -> PgResult<Vec<Activity>> {
        use schema::activities::dsl::*;

        let rows = activities
            .filter(record_id.eq(target_record))
            .select(Activity::as_select())
            .order(created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }
}
