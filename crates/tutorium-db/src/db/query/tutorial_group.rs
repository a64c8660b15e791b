//! Query composition for `tutorial_group`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::tutorial_group;
use crate::model::tutorial_group::TutorialGroup;

/// ## Summary
/// Loads a tutorial group and takes a row lock on it for the remainder of the
/// current transaction.
///
/// Reconciliation runs for the same group must be serialized; every write
/// path locks the group row first so interleaved reads cannot resurrect
/// deleted sessions or double-create occurrences.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find_for_update(
    conn: &mut DbConnection<'_>,
    id: Uuid,
) -> QueryResult<Option<TutorialGroup>> {
    tutorial_group::table
        .find(id)
        .for_update()
        .select(TutorialGroup::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads all tutorial groups of a course, locking each row for the current
/// transaction (course-wide cascades reconcile every group atomically).
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn by_course_for_update(
    conn: &mut DbConnection<'_>,
    course_id: Uuid,
) -> QueryResult<Vec<TutorialGroup>> {
    tutorial_group::table
        .filter(tutorial_group::course_id.eq(course_id))
        .order(tutorial_group::id)
        .for_update()
        .select(TutorialGroup::as_select())
        .load(conn)
        .await
}
