//! Query composition for `tutorial_group_schedule`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::tutorial_group_schedule;
use crate::model::schedule::{NewSchedule, Schedule, ScheduleChangeset};

/// ## Summary
/// Inserts a schedule and returns the created row.
///
/// ## Errors
/// Returns an error if the database operation fails (including the unique
/// constraint on `tutorial_group_id`).
pub async fn create(conn: &mut DbConnection<'_>, schedule: &NewSchedule<'_>) -> QueryResult<Schedule> {
    diesel::insert_into(tutorial_group_schedule::table)
        .values(schedule)
        .returning(Schedule::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Finds a schedule by id.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<Schedule>> {
    tutorial_group_schedule::table
        .find(id)
        .select(Schedule::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Finds the schedule owned by a tutorial group, if any.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn by_group(conn: &mut DbConnection<'_>, group_id: Uuid) -> QueryResult<Option<Schedule>> {
    tutorial_group_schedule::table
        .filter(tutorial_group_schedule::tutorial_group_id.eq(group_id))
        .select(Schedule::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Applies a partial update to a schedule and returns the updated row.
///
/// ## Errors
/// Returns an error if the database operation fails or the row is gone.
pub async fn update(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    changeset: &ScheduleChangeset<'_>,
) -> QueryResult<Schedule> {
    diesel::update(tutorial_group_schedule::table.find(id))
        .set(changeset)
        .returning(Schedule::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Deletes a schedule row. Generated sessions are removed separately by the
/// service before this runs.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(tutorial_group_schedule::table.find(id))
        .execute(conn)
        .await
}
