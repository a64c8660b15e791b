//! Query composition for `tutorial_group_session`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::SessionStatus;
use crate::db::schema::{tutorial_group, tutorial_group_session};
use crate::model::session::{NewSession, Session};

/// ## Summary
/// Inserts one session and returns the created row.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn create(conn: &mut DbConnection<'_>, session: &NewSession<'_>) -> QueryResult<Session> {
    diesel::insert_into(tutorial_group_session::table)
        .values(session)
        .returning(Session::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Inserts multiple sessions in a batch and returns the created rows in
/// insertion order.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert_batch(
    conn: &mut DbConnection<'_>,
    sessions: &[NewSession<'_>],
) -> QueryResult<Vec<Session>> {
    if sessions.is_empty() {
        return Ok(Vec::new());
    }

    diesel::insert_into(tutorial_group_session::table)
        .values(sessions)
        .returning(Session::as_returning())
        .get_results(conn)
        .await
}

/// ## Summary
/// Finds a session by id.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<Session>> {
    tutorial_group_session::table
        .find(id)
        .select(Session::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads all sessions of a tutorial group, ascending by start instant.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn by_group(conn: &mut DbConnection<'_>, group_id: Uuid) -> QueryResult<Vec<Session>> {
    tutorial_group_session::table
        .filter(tutorial_group_session::tutorial_group_id.eq(group_id))
        .order(tutorial_group_session::starts_at)
        .select(Session::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Loads all sessions of every tutorial group in a course, ascending by start
/// instant (free periods apply course-wide).
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn by_course(conn: &mut DbConnection<'_>, course_id: Uuid) -> QueryResult<Vec<Session>> {
    tutorial_group_session::table
        .inner_join(tutorial_group::table)
        .filter(tutorial_group::course_id.eq(course_id))
        .order(tutorial_group_session::starts_at)
        .select(Session::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Deletes sessions by id.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_by_ids(conn: &mut DbConnection<'_>, ids: &[Uuid]) -> QueryResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    diesel::delete(tutorial_group_session::table.filter(tutorial_group_session::id.eq_any(ids)))
        .execute(conn)
        .await
}

/// ## Summary
/// Deletes every session generated by the given schedule. Individual sessions
/// carry no schedule back-reference and are untouched.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_generated_by_schedule(
    conn: &mut DbConnection<'_>,
    schedule_id: Uuid,
) -> QueryResult<usize> {
    diesel::delete(
        tutorial_group_session::table.filter(tutorial_group_session::schedule_id.eq(schedule_id)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Patches the denormalized location of every session generated by a
/// schedule, preserving session identity (metadata-only schedule update).
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update_location_for_schedule(
    conn: &mut DbConnection<'_>,
    schedule_id: Uuid,
    location: &str,
) -> QueryResult<usize> {
    diesel::update(
        tutorial_group_session::table.filter(tutorial_group_session::schedule_id.eq(schedule_id)),
    )
    .set(tutorial_group_session::location.eq(location))
    .execute(conn)
    .await
}

/// ## Summary
/// Sets the status (and explanation) of one session in place.
///
/// ## Errors
/// Returns an error if the database operation fails or the row is gone.
pub async fn set_status(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    status: SessionStatus,
    explanation: Option<&str>,
) -> QueryResult<Session> {
    diesel::update(tutorial_group_session::table.find(id))
        .set((
            tutorial_group_session::status.eq(status),
            tutorial_group_session::status_explanation.eq(explanation),
        ))
        .returning(Session::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Deletes one session by id.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(tutorial_group_session::table.find(id))
        .execute(conn)
        .await
}
