//! Query composition for `free_period`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::free_period;
use crate::model::free_period::{FreePeriod, NewFreePeriod};

/// ## Summary
/// Inserts a free period and returns the created row.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn create(
    conn: &mut DbConnection<'_>,
    period: &NewFreePeriod<'_>,
) -> QueryResult<FreePeriod> {
    diesel::insert_into(free_period::table)
        .values(period)
        .returning(FreePeriod::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Finds a free period by id.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<FreePeriod>> {
    free_period::table
        .find(id)
        .select(FreePeriod::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads all free periods of a configuration, ascending by start instant.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn by_configuration(
    conn: &mut DbConnection<'_>,
    configuration_id: Uuid,
) -> QueryResult<Vec<FreePeriod>> {
    free_period::table
        .filter(free_period::configuration_id.eq(configuration_id))
        .order(free_period::period_start)
        .select(FreePeriod::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Deletes one free period by id.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(free_period::table.find(id)).execute(conn).await
}

/// ## Summary
/// Deletes every free period of a configuration. Used when the course
/// timezone changes and the stored instants become meaningless.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_by_configuration(
    conn: &mut DbConnection<'_>,
    configuration_id: Uuid,
) -> QueryResult<usize> {
    diesel::delete(free_period::table.filter(free_period::configuration_id.eq(configuration_id)))
        .execute(conn)
        .await
}
