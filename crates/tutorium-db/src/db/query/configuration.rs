//! Query composition for `course_schedule_configuration`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::course_schedule_configuration;
use crate::model::configuration::{
    ConfigurationChangeset, CourseScheduleConfiguration, NewCourseScheduleConfiguration,
};

/// ## Summary
/// Inserts a configuration and returns the created row.
///
/// ## Errors
/// Returns an error if the database operation fails (including the unique
/// constraint on `course_id`).
pub async fn create(
    conn: &mut DbConnection<'_>,
    configuration: &NewCourseScheduleConfiguration<'_>,
) -> QueryResult<CourseScheduleConfiguration> {
    diesel::insert_into(course_schedule_configuration::table)
        .values(configuration)
        .returning(CourseScheduleConfiguration::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Finds a configuration by id.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(
    conn: &mut DbConnection<'_>,
    id: Uuid,
) -> QueryResult<Option<CourseScheduleConfiguration>> {
    course_schedule_configuration::table
        .find(id)
        .select(CourseScheduleConfiguration::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Finds the configuration of a course, if any.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn by_course(
    conn: &mut DbConnection<'_>,
    course_id: Uuid,
) -> QueryResult<Option<CourseScheduleConfiguration>> {
    course_schedule_configuration::table
        .filter(course_schedule_configuration::course_id.eq(course_id))
        .select(CourseScheduleConfiguration::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Applies a partial update to a configuration and returns the updated row.
///
/// ## Errors
/// Returns an error if the database operation fails or the row is gone.
pub async fn update(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    changeset: &ConfigurationChangeset<'_>,
) -> QueryResult<CourseScheduleConfiguration> {
    diesel::update(course_schedule_configuration::table.find(id))
        .set(changeset)
        .returning(CourseScheduleConfiguration::as_returning())
        .get_result(conn)
        .await
}
