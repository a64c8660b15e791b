//! Course-wide free periods.
//!
//! A free period is an exclusion window (holidays, exam weeks) scoped to one
//! course configuration. Creating one cancels every overlapping session of
//! the course in place; deleting one reactivates the sessions it cancelled,
//! unless another remaining period still covers them.

use chrono::NaiveDateTime;
use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use tutorium_cal::cal;
use tutorium_cal::error::CalError;
use tutorium_db::db::connection::DbConnection;
use tutorium_db::db::enums::SessionStatus;
use tutorium_db::db::query::{
    configuration as configuration_query, free_period as free_period_query,
    session as session_query, tutorial_group as tutorial_group_query,
};
use tutorium_db::model::free_period::{FreePeriod, NewFreePeriod};
use tutorium_db::model::session::Session;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::observer::{ScheduleChangeObserver, SessionChange};

/// Request to block out a window of local course time.
#[derive(Debug, Clone)]
pub struct CreateFreePeriodContext {
    pub course_id: Uuid,
    /// Start of the window in the course's local time (inclusive).
    pub starts_at: NaiveDateTime,
    /// End of the window in the course's local time. Occurrence starts are
    /// checked against the window with inclusive bounds.
    pub ends_at: NaiveDateTime,
    pub reason: String,
}

/// ## Summary
/// Creates a free period and cancels every session of the course whose
/// interval overlaps it. Already-cancelled sessions keep their original
/// explanation.
///
/// The whole course is reconciled in one transaction; every tutorial group
/// of the course is locked for the duration.
///
/// ## Errors
/// Returns an error if the course has no configuration, the window is empty
/// or inverted, or the timezone stored on the configuration fails to
/// resolve.
#[tracing::instrument(skip(conn, observer, ctx), fields(course_id = %ctx.course_id))]
pub async fn create_free_period(
    conn: &mut DbConnection<'_>,
    observer: &dyn ScheduleChangeObserver,
    ctx: &CreateFreePeriodContext,
) -> ServiceResult<FreePeriod> {
    let ctx = ctx.clone();

    let (period, changes) = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let configuration = configuration_query::by_course(tx, ctx.course_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "schedule configuration for course {}",
                            ctx.course_id
                        ))
                    })?;

                if ctx.ends_at <= ctx.starts_at {
                    return Err(CalError::InvalidSchedule(format!(
                        "free period end {} is not after start {}",
                        ctx.ends_at, ctx.starts_at
                    ))
                    .into());
                }

                // Serializes against every per-group operation of the course.
                tutorial_group_query::by_course_for_update(tx, ctx.course_id).await?;

                let tz = cal::resolve_timezone(&configuration.time_zone)?;
                let period_start = cal::zoned_instant(ctx.starts_at, tz);
                let period_end = cal::zoned_instant(ctx.ends_at, tz);

                let period = free_period_query::create(
                    tx,
                    &NewFreePeriod {
                        configuration_id: configuration.id,
                        period_start,
                        period_end,
                        reason: &ctx.reason,
                    },
                )
                .await?;

                let sessions = session_query::by_course(tx, ctx.course_id).await?;
                let mut changes: Vec<SessionChange> = Vec::new();
                for session in &sessions {
                    if session.status != SessionStatus::Active {
                        continue;
                    }
                    if !cal::overlaps(
                        session.starts_at,
                        session.ends_at,
                        period.period_start,
                        period.period_end,
                    ) {
                        continue;
                    }

                    session_query::set_status(
                        tx,
                        session.id,
                        SessionStatus::Cancelled,
                        Some(&period.reason),
                    )
                    .await?;
                    bump(&mut changes, session.tutorial_group_id, |c| c.cancelled += 1);
                }

                Ok((period, changes))
            }
            .scope_boxed()
        })
        .await?;

    for change in &changes {
        observer.sessions_changed(change);
    }
    Ok(period)
}

/// ## Summary
/// Deletes a free period and reactivates the sessions it cancelled.
///
/// A session is reactivated when its explanation matches the deleted
/// period's reason and no remaining free period of the configuration still
/// overlaps it. Sessions cancelled by hand (different explanation) stay
/// cancelled.
///
/// ## Errors
/// Returns an error if the free period or its configuration does not exist.
#[tracing::instrument(skip(conn, observer))]
pub async fn delete_free_period(
    conn: &mut DbConnection<'_>,
    observer: &dyn ScheduleChangeObserver,
    free_period_id: Uuid,
) -> ServiceResult<()> {
    let changes = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let period = free_period_query::find(tx, free_period_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("free period {free_period_id}"))
                    })?;
                let configuration = configuration_query::find(tx, period.configuration_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "schedule configuration {}",
                            period.configuration_id
                        ))
                    })?;

                tutorial_group_query::by_course_for_update(tx, configuration.course_id).await?;
                free_period_query::delete(tx, period.id).await?;

                let remaining = free_period_query::by_configuration(tx, configuration.id).await?;
                let sessions = session_query::by_course(tx, configuration.course_id).await?;

                let mut changes: Vec<SessionChange> = Vec::new();
                for session in &sessions {
                    if !reactivation_candidate(session, &period.reason, &remaining) {
                        continue;
                    }

                    session_query::set_status(tx, session.id, SessionStatus::Active, None).await?;
                    bump(&mut changes, session.tutorial_group_id, |c| {
                        c.reactivated += 1;
                    });
                }

                Ok(changes)
            }
            .scope_boxed()
        })
        .await?;

    for change in &changes {
        observer.sessions_changed(change);
    }
    Ok(())
}

/// A session comes back when the deleted period's reason is the one that
/// cancelled it and no remaining period still overlaps its interval.
fn reactivation_candidate(
    session: &Session,
    deleted_reason: &str,
    remaining: &[FreePeriod],
) -> bool {
    if session.status != SessionStatus::Cancelled {
        return false;
    }
    if session.status_explanation.as_deref() != Some(deleted_reason) {
        return false;
    }
    !remaining.iter().any(|other| {
        cal::overlaps(
            session.starts_at,
            session.ends_at,
            other.period_start,
            other.period_end,
        )
    })
}

fn bump(changes: &mut Vec<SessionChange>, group_id: Uuid, apply: impl FnOnce(&mut SessionChange)) {
    if let Some(change) = changes
        .iter_mut()
        .find(|change| change.tutorial_group_id == group_id)
    {
        apply(change);
    } else {
        let mut change = SessionChange::none(group_id);
        apply(&mut change);
        changes.push(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn cancelled_session(reason: &str) -> Session {
        Session {
            id: Uuid::new_v4(),
            tutorial_group_id: Uuid::new_v4(),
            schedule_id: Some(Uuid::new_v4()),
            starts_at: Utc.with_ymd_and_hms(2024, 4, 3, 8, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2024, 4, 3, 9, 0, 0).unwrap(),
            location: "H 0104".to_owned(),
            status: SessionStatus::Cancelled,
            status_explanation: Some(reason.to_owned()),
        }
    }

    fn period(start_day: u32, end_day: u32) -> FreePeriod {
        FreePeriod {
            id: Uuid::new_v4(),
            configuration_id: Uuid::new_v4(),
            period_start: Utc.with_ymd_and_hms(2024, 4, start_day, 0, 0, 0).unwrap(),
            period_end: Utc.with_ymd_and_hms(2024, 4, end_day, 0, 0, 0).unwrap(),
            reason: "spring break".to_owned(),
        }
    }

    #[test_log::test]
    fn test_matching_reason_without_remaining_cover_reactivates() {
        let session = cancelled_session("spring break");
        assert!(reactivation_candidate(&session, "spring break", &[]));
    }

    #[test_log::test]
    fn test_session_still_covered_by_remaining_period_stays_cancelled() {
        let session = cancelled_session("spring break");
        assert!(!reactivation_candidate(
            &session,
            "spring break",
            &[period(1, 7)]
        ));
    }

    #[test_log::test]
    fn test_remaining_period_elsewhere_does_not_block_reactivation() {
        let session = cancelled_session("spring break");
        assert!(reactivation_candidate(
            &session,
            "spring break",
            &[period(20, 21)]
        ));
    }

    #[test_log::test]
    fn test_manually_cancelled_session_stays_cancelled() {
        let session = cancelled_session("tutor ill");
        assert!(!reactivation_candidate(&session, "spring break", &[]));
    }

    #[test_log::test]
    fn test_active_session_is_never_a_candidate() {
        let mut session = cancelled_session("spring break");
        session.status = SessionStatus::Active;
        session.status_explanation = None;
        assert!(!reactivation_candidate(&session, "spring break", &[]));
    }

    #[test_log::test]
    fn test_bump_groups_changes_by_tutorial_group() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut changes = Vec::new();

        bump(&mut changes, a, |c| c.cancelled += 1);
        bump(&mut changes, a, |c| c.cancelled += 1);
        bump(&mut changes, b, |c| c.reactivated += 1);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].cancelled, 2);
        assert_eq!(changes[1].reactivated, 1);
    }
}
