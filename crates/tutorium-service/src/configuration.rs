//! Course schedule configuration and the change cascade.
//!
//! The configuration fixes the course timezone and the tutorial period every
//! schedule of the course is clipped to. Changing either re-expands every
//! schedule of the course in a single transaction; a conflict in any group
//! rolls the whole change back.

use chrono::NaiveDate;
use chrono_tz::Tz;
use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use tutorium_cal::cal;
use tutorium_cal::error::CalError;
use tutorium_db::db::connection::DbConnection;
use tutorium_db::db::query::{
    configuration as configuration_query, free_period as free_period_query,
    schedule as schedule_query, tutorial_group as tutorial_group_query,
};
use tutorium_db::model::configuration::{
    ConfigurationChangeset, CourseScheduleConfiguration, NewCourseScheduleConfiguration,
};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::observer::{ScheduleChangeObserver, SessionChange};
use crate::schedule::reconcile::regenerate_for_group;

/// Request to establish the scheduling bounds of a course.
#[derive(Debug, Clone)]
pub struct CreateConfigurationContext {
    pub course_id: Uuid,
    /// IANA timezone name, e.g. `Europe/Berlin`.
    pub time_zone: String,
    /// First civil date of the tutorial period (inclusive).
    pub period_start: NaiveDate,
    /// Last civil date of the tutorial period (inclusive).
    pub period_end: NaiveDate,
}

/// Partial configuration update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationPatch {
    pub time_zone: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

impl ConfigurationPatch {
    const fn is_empty(&self) -> bool {
        self.time_zone.is_none() && self.period_start.is_none() && self.period_end.is_none()
    }
}

/// Diffs a patch against the stored row: a field re-sent with its current
/// value is not a change. Returns (timezone changed, period changed).
fn effective_changes(
    current: &CourseScheduleConfiguration,
    patch: &ConfigurationPatch,
) -> (bool, bool) {
    let timezone_changed = patch
        .time_zone
        .as_deref()
        .is_some_and(|tz| tz != current.time_zone);
    let period_changed = patch
        .period_start
        .is_some_and(|start| start != current.period_start)
        || patch.period_end.is_some_and(|end| end != current.period_end);
    (timezone_changed, period_changed)
}

fn validate_period(start: NaiveDate, end: NaiveDate) -> ServiceResult<()> {
    if end < start {
        return Err(CalError::InvalidSchedule(format!(
            "tutorial period end {end} precedes start {start}"
        ))
        .into());
    }
    Ok(())
}

/// ## Summary
/// Creates the schedule configuration of a course.
///
/// ## Errors
/// Returns an error if the timezone name does not resolve, the period is
/// inverted, or the course already has a configuration.
#[tracing::instrument(skip(conn, ctx), fields(course_id = %ctx.course_id))]
pub async fn create_course_configuration(
    conn: &mut DbConnection<'_>,
    ctx: &CreateConfigurationContext,
) -> ServiceResult<CourseScheduleConfiguration> {
    let ctx = ctx.clone();

    conn.transaction::<_, ServiceError, _>(move |tx| {
        async move {
            cal::resolve_timezone(&ctx.time_zone)?;
            validate_period(ctx.period_start, ctx.period_end)?;

            if configuration_query::by_course(tx, ctx.course_id).await?.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "course {} already has a schedule configuration",
                    ctx.course_id
                )));
            }

            let configuration = configuration_query::create(
                tx,
                &NewCourseScheduleConfiguration {
                    course_id: ctx.course_id,
                    time_zone: &ctx.time_zone,
                    period_start: ctx.period_start,
                    period_end: ctx.period_end,
                },
            )
            .await?;

            Ok(configuration)
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Applies a partial update to a course's configuration and cascades it to
/// every scheduled tutorial group of the course.
///
/// A timezone change first clears the course's free periods (their instants
/// were computed under the old zone). Every schedule is then re-expanded
/// under the updated configuration; individual sessions keep their instants,
/// and a conflict with one of them rolls back the entire update.
///
/// ## Errors
/// Returns an error if the course has no configuration, the patched values
/// are invalid, or regeneration conflicts in any group.
#[tracing::instrument(skip(conn, observer, patch))]
pub async fn update_course_configuration(
    conn: &mut DbConnection<'_>,
    observer: &dyn ScheduleChangeObserver,
    course_id: Uuid,
    patch: &ConfigurationPatch,
) -> ServiceResult<CourseScheduleConfiguration> {
    let patch = patch.clone();

    let (configuration, changes) = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let current = configuration_query::by_course(tx, course_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "schedule configuration for course {course_id}"
                        ))
                    })?;

                let time_zone = patch.time_zone.as_deref().unwrap_or(&current.time_zone);
                cal::resolve_timezone(time_zone)?;
                validate_period(
                    patch.period_start.unwrap_or(current.period_start),
                    patch.period_end.unwrap_or(current.period_end),
                )?;

                // A field re-sent with its stored value is a no-op; session
                // identities survive such a request.
                let (timezone_changed, period_changed) = effective_changes(&current, &patch);
                if patch.is_empty() || (!timezone_changed && !period_changed) {
                    return Ok((current, Vec::new()));
                }

                let groups = tutorial_group_query::by_course_for_update(tx, course_id).await?;

                if timezone_changed {
                    let purged =
                        free_period_query::delete_by_configuration(tx, current.id).await?;
                    tracing::info!(
                        configuration_id = %current.id,
                        purged,
                        "timezone changed, free periods cleared"
                    );
                }

                let updated = configuration_query::update(
                    tx,
                    current.id,
                    &ConfigurationChangeset {
                        time_zone: patch.time_zone.as_deref(),
                        period_start: patch.period_start,
                        period_end: patch.period_end,
                    },
                )
                .await?;

                let mut changes = Vec::new();
                for group in &groups {
                    let Some(schedule) = schedule_query::by_group(tx, group.id).await? else {
                        continue;
                    };
                    let applied =
                        regenerate_for_group(tx, group.id, &schedule, &updated).await?;
                    changes.push(SessionChange {
                        created: applied.created.len(),
                        deleted: applied.deleted,
                        ..SessionChange::none(group.id)
                    });
                }

                Ok((updated, changes))
            }
            .scope_boxed()
        })
        .await?;

    for change in &changes {
        observer.sessions_changed(change);
    }
    Ok(configuration)
}

/// ## Summary
/// Resolves the timezone currently in effect for a course.
///
/// ## Errors
/// Returns an error if the course has no configuration or the stored name no
/// longer resolves against the bundled tz database.
pub async fn effective_timezone(conn: &mut DbConnection<'_>, course_id: Uuid) -> ServiceResult<Tz> {
    let configuration = configuration_query::by_course(conn, course_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("schedule configuration for course {course_id}"))
        })?;
    Ok(cal::resolve_timezone(&configuration.time_zone)?)
}
