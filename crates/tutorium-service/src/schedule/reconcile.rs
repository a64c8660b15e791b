//! Applies the pure generation plan for one tutorial group.
//!
//! This is the writing half of the session reconciler: the pure half
//! ([`tutorium_cal::cal::plan`]) decides, this module persists. Callers must
//! already hold the group's row lock and run inside a transaction.

use tutorium_cal::cal::{self, FreePeriodIndex};
use tutorium_db::db::connection::DbConnection;
use tutorium_db::db::query::{free_period as free_period_query, session as session_query};
use tutorium_db::model::configuration::CourseScheduleConfiguration;
use tutorium_db::model::free_period::FreePeriod;
use tutorium_db::model::schedule::Schedule;
use tutorium_db::model::session::{NewSession, Session};
use uuid::Uuid;

use crate::error::ServiceResult;

/// Sessions written and removed by one plan application.
pub(crate) struct AppliedPlan {
    pub created: Vec<Session>,
    pub deleted: usize,
}

/// ## Summary
/// Regenerates the schedule-generated sessions of one tutorial group:
/// expands the schedule under the configuration's timezone and bounding
/// period, tags free-period occurrences cancelled, deletes the previous
/// generation, and inserts the new one.
///
/// Individual sessions are never written to; a desired occurrence
/// overlapping one aborts with `SchedulingConflict` before anything is
/// deleted, and the surrounding transaction discards any partial work on
/// other errors.
///
/// ## Errors
/// Returns `CalError` variants for invalid rules, unknown timezones, or
/// conflicts, and database errors from the applied writes.
pub(crate) async fn regenerate_for_group(
    tx: &mut DbConnection<'_>,
    group_id: Uuid,
    schedule: &Schedule,
    configuration: &CourseScheduleConfiguration,
) -> ServiceResult<AppliedPlan> {
    let tz = cal::resolve_timezone(&configuration.time_zone)?;
    let recurrence = schedule.recurrence()?;

    let free_periods = free_period_query::by_configuration(tx, configuration.id).await?;
    let index = FreePeriodIndex::new(free_periods.iter().map(FreePeriod::to_cal).collect());

    let desired =
        cal::build_occurrences(&recurrence, &configuration.bounding_period(), tz, &index)?;

    let existing = session_query::by_group(tx, group_id).await?;
    let views: Vec<_> = existing.iter().map(Session::planning_view).collect();
    let plan = cal::plan_generation(&desired, &views)?;

    let deleted = session_query::delete_by_ids(tx, &plan.delete).await?;

    let new_sessions: Vec<NewSession<'_>> = plan
        .create
        .iter()
        .map(|occurrence| NewSession {
            tutorial_group_id: group_id,
            schedule_id: Some(schedule.id),
            starts_at: occurrence.start,
            ends_at: occurrence.end,
            location: &schedule.location,
            status: occurrence.status.into(),
            status_explanation: occurrence.status_explanation.as_deref(),
        })
        .collect();
    let created = session_query::insert_batch(tx, &new_sessions).await?;

    tracing::debug!(
        %group_id,
        schedule_id = %schedule.id,
        created = created.len(),
        deleted,
        "applied generation plan"
    );

    Ok(AppliedPlan { created, deleted })
}
