//! Schedule lifecycle operations.
//!
//! Creating, partially updating, and deleting the recurrence rule of a
//! tutorial group. Updates that leave every occurrence-affecting field
//! unchanged are applied as metadata patches so session identities (and any
//! references other subsystems hold to them) survive.

use chrono::{NaiveDate, NaiveTime, Weekday};
use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use tutorium_cal::cal::{Recurrence, requires_regeneration};
use tutorium_cal::error::CalError;
use tutorium_db::db::connection::DbConnection;
use tutorium_db::db::query::{
    configuration as configuration_query, schedule as schedule_query, session as session_query,
    tutorial_group as tutorial_group_query,
};
use tutorium_db::model::configuration::CourseScheduleConfiguration;
use tutorium_db::model::schedule::{NewSchedule, Schedule, ScheduleChangeset, iso_from_weekday};
use tutorium_db::model::session::Session;
use tutorium_db::model::tutorial_group::TutorialGroup;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::observer::{ScheduleChangeObserver, SessionChange};
use crate::schedule::reconcile::regenerate_for_group;

pub(crate) mod reconcile;

/// Request to give a tutorial group a recurring meeting pattern.
#[derive(Debug, Clone)]
pub struct CreateScheduleContext {
    pub tutorial_group_id: Uuid,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: String,
    /// First civil date of the validity window (inclusive).
    pub valid_from: NaiveDate,
    /// Last civil date of the validity window (inclusive).
    pub valid_to: NaiveDate,
    /// Weeks between occurrences; 1 = weekly.
    pub repetition_frequency: u32,
}

/// Partial schedule update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SchedulePatch {
    pub weekday: Option<Weekday>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub repetition_frequency: Option<u32>,
}

/// Result of a schedule operation: the rule plus all sessions of the group
/// after the operation (generated and individual).
#[derive(Debug, Clone)]
pub struct ScheduleWithSessions {
    pub schedule: Schedule,
    pub sessions: Vec<Session>,
}

pub(crate) async fn locked_group(
    tx: &mut DbConnection<'_>,
    group_id: Uuid,
) -> ServiceResult<TutorialGroup> {
    tutorial_group_query::find_for_update(tx, group_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("tutorial group {group_id}")))
}

pub(crate) async fn configuration_for(
    tx: &mut DbConnection<'_>,
    course_id: Uuid,
) -> ServiceResult<CourseScheduleConfiguration> {
    configuration_query::by_course(tx, course_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("schedule configuration for course {course_id}"))
        })
}

fn frequency_to_db(frequency: u32) -> ServiceResult<i32> {
    i32::try_from(frequency).map_err(|_| {
        ServiceError::CalendarError(CalError::InvalidSchedule(format!(
            "repetition frequency {frequency} out of range"
        )))
    })
}

/// Applies a partial update to an immutable recurrence snapshot.
fn patched_recurrence(old: &Recurrence, patch: &SchedulePatch) -> Recurrence {
    Recurrence {
        weekday: patch.weekday.unwrap_or(old.weekday),
        start_time: patch.start_time.unwrap_or(old.start_time),
        end_time: patch.end_time.unwrap_or(old.end_time),
        valid_from: patch.valid_from.unwrap_or(old.valid_from),
        valid_to: patch.valid_to.unwrap_or(old.valid_to),
        interval_weeks: patch.repetition_frequency.unwrap_or(old.interval_weeks),
    }
}

/// ## Summary
/// Creates the schedule of a tutorial group and generates its sessions.
///
/// ## Side Effects
/// - Persists the schedule and one session per occurrence (cancelled where a
///   free period applies) in a single transaction
/// - Notifies the observer after commit
///
/// ## Errors
/// Returns an error if:
/// - The group or course configuration does not exist
/// - The group already has a schedule
/// - The rule is structurally invalid or an occurrence overlaps an
///   individual session (nothing is persisted)
#[tracing::instrument(skip(conn, observer, ctx), fields(tutorial_group_id = %ctx.tutorial_group_id))]
pub async fn create_schedule(
    conn: &mut DbConnection<'_>,
    observer: &dyn ScheduleChangeObserver,
    ctx: &CreateScheduleContext,
) -> ServiceResult<ScheduleWithSessions> {
    let ctx = ctx.clone();

    let (result, change) = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let group = locked_group(tx, ctx.tutorial_group_id).await?;
                if schedule_query::by_group(tx, group.id).await?.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "tutorial group {} already has a schedule",
                        group.id
                    )));
                }
                let configuration = configuration_for(tx, group.course_id).await?;

                let recurrence = Recurrence {
                    weekday: ctx.weekday,
                    start_time: ctx.start_time,
                    end_time: ctx.end_time,
                    valid_from: ctx.valid_from,
                    valid_to: ctx.valid_to,
                    interval_weeks: ctx.repetition_frequency,
                };
                recurrence.validate()?;

                let new_schedule = NewSchedule {
                    tutorial_group_id: group.id,
                    day_of_week: iso_from_weekday(ctx.weekday),
                    start_time: ctx.start_time,
                    end_time: ctx.end_time,
                    location: &ctx.location,
                    valid_from: ctx.valid_from,
                    valid_to: ctx.valid_to,
                    repetition_frequency: frequency_to_db(ctx.repetition_frequency)?,
                };
                let schedule = schedule_query::create(tx, &new_schedule).await?;

                let applied = regenerate_for_group(tx, group.id, &schedule, &configuration).await?;
                let change = SessionChange {
                    created: applied.created.len(),
                    deleted: applied.deleted,
                    ..SessionChange::none(group.id)
                };

                let sessions = session_query::by_group(tx, group.id).await?;
                Ok((ScheduleWithSessions { schedule, sessions }, change))
            }
            .scope_boxed()
        })
        .await?;

    observer.schedule_created(result.schedule.tutorial_group_id, result.schedule.id);
    observer.sessions_changed(&change);
    Ok(result)
}

/// ## Summary
/// Applies a partial update to a schedule.
///
/// The occurrence-affecting fields of the old value are snapshotted first;
/// only when the patched value differs in one of them are the generated
/// sessions regenerated. A location-only change patches the schedule and the
/// denormalized session locations in place.
///
/// ## Errors
/// Returns an error if the schedule does not exist, the patched rule is
/// invalid, or regeneration conflicts with an individual session (nothing is
/// persisted).
#[tracing::instrument(skip(conn, observer, patch))]
pub async fn update_schedule(
    conn: &mut DbConnection<'_>,
    observer: &dyn ScheduleChangeObserver,
    schedule_id: Uuid,
    patch: &SchedulePatch,
) -> ServiceResult<ScheduleWithSessions> {
    let patch = patch.clone();

    let (result, change, regenerated) = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let schedule = schedule_query::find(tx, schedule_id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("schedule {schedule_id}")))?;
                let group = locked_group(tx, schedule.tutorial_group_id).await?;

                let old = schedule.recurrence()?;
                let new = patched_recurrence(&old, &patch);
                new.validate()?;

                if requires_regeneration(&old, &new) {
                    let changeset = ScheduleChangeset {
                        day_of_week: patch.weekday.map(iso_from_weekday),
                        start_time: patch.start_time,
                        end_time: patch.end_time,
                        location: patch.location.as_deref(),
                        valid_from: patch.valid_from,
                        valid_to: patch.valid_to,
                        repetition_frequency: match patch.repetition_frequency {
                            Some(frequency) => Some(frequency_to_db(frequency)?),
                            None => None,
                        },
                    };
                    let updated = schedule_query::update(tx, schedule.id, &changeset).await?;

                    let configuration = configuration_for(tx, group.course_id).await?;
                    let applied =
                        regenerate_for_group(tx, group.id, &updated, &configuration).await?;
                    let change = SessionChange {
                        created: applied.created.len(),
                        deleted: applied.deleted,
                        ..SessionChange::none(group.id)
                    };

                    let sessions = session_query::by_group(tx, group.id).await?;
                    Ok((
                        ScheduleWithSessions {
                            schedule: updated,
                            sessions,
                        },
                        change,
                        true,
                    ))
                } else {
                    let schedule = if let Some(location) = patch.location.as_deref() {
                        let updated = schedule_query::update(
                            tx,
                            schedule.id,
                            &ScheduleChangeset {
                                location: Some(location),
                                ..ScheduleChangeset::default()
                            },
                        )
                        .await?;
                        session_query::update_location_for_schedule(tx, schedule.id, location)
                            .await?;
                        updated
                    } else {
                        schedule
                    };

                    let sessions = session_query::by_group(tx, group.id).await?;
                    Ok((
                        ScheduleWithSessions { schedule, sessions },
                        SessionChange::none(group.id),
                        false,
                    ))
                }
            }
            .scope_boxed()
        })
        .await?;

    if regenerated {
        observer.sessions_changed(&change);
    }
    Ok(result)
}

/// ## Summary
/// Deletes a schedule and every session it generated. Individual sessions
/// remain.
///
/// ## Errors
/// Returns an error if the schedule does not exist or a database operation
/// fails.
#[tracing::instrument(skip(conn, observer))]
pub async fn delete_schedule(
    conn: &mut DbConnection<'_>,
    observer: &dyn ScheduleChangeObserver,
    schedule_id: Uuid,
) -> ServiceResult<usize> {
    let (group_id, deleted) = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let schedule = schedule_query::find(tx, schedule_id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("schedule {schedule_id}")))?;
                let group = locked_group(tx, schedule.tutorial_group_id).await?;

                let deleted = session_query::delete_generated_by_schedule(tx, schedule.id).await?;
                schedule_query::delete(tx, schedule.id).await?;

                Ok((group.id, deleted))
            }
            .scope_boxed()
        })
        .await?;

    observer.schedule_deleted(group_id, schedule_id);
    observer.sessions_changed(&SessionChange {
        deleted,
        ..SessionChange::none(group_id)
    });
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn base() -> Recurrence {
        Recurrence {
            weekday: Weekday::Mon,
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            valid_from: NaiveDate::from_ymd_opt(2024, 3, 25).unwrap(),
            valid_to: NaiveDate::from_ymd_opt(2024, 7, 15).unwrap(),
            interval_weeks: 1,
        }
    }

    #[test_log::test]
    fn test_empty_patch_is_a_no_op() {
        let old = base();
        let new = patched_recurrence(&old, &SchedulePatch::default());
        assert_eq!(old, new);
        assert!(!requires_regeneration(&old, &new));
    }

    #[test_log::test]
    fn test_location_only_patch_does_not_regenerate() {
        let old = base();
        let patch = SchedulePatch {
            location: Some("H 0105".to_owned()),
            ..SchedulePatch::default()
        };
        let new = patched_recurrence(&old, &patch);
        assert!(!requires_regeneration(&old, &new));
    }

    #[test_log::test]
    fn test_patch_equal_to_current_values_does_not_regenerate() {
        let old = base();
        let patch = SchedulePatch {
            weekday: Some(old.weekday),
            start_time: Some(old.start_time),
            repetition_frequency: Some(old.interval_weeks),
            ..SchedulePatch::default()
        };
        assert!(!requires_regeneration(&old, &patched_recurrence(&old, &patch)));
    }

    #[test_log::test]
    fn test_weekday_patch_regenerates() {
        let old = base();
        let patch = SchedulePatch {
            weekday: Some(Weekday::Thu),
            ..SchedulePatch::default()
        };
        assert!(requires_regeneration(&old, &patched_recurrence(&old, &patch)));
    }

    #[test_log::test]
    fn test_frequency_to_db_rejects_overflow() {
        assert!(frequency_to_db(u32::MAX).is_err());
        assert_eq!(frequency_to_db(2).unwrap(), 2);
    }
}
