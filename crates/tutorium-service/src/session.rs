//! Individual session lifecycle.
//!
//! Individual sessions are dated one-off meetings created outside a
//! schedule. They are first-class citizens of the conflict rules: schedule
//! regeneration refuses to collide with them, and they in turn may not be
//! created on top of an existing session of the same group.

use chrono::{NaiveDate, NaiveTime};
use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use tutorium_cal::cal;
use tutorium_cal::error::CalError;
use tutorium_db::db::connection::DbConnection;
use tutorium_db::db::query::session as session_query;
use tutorium_db::model::session::{NewSession, Session};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::observer::{ScheduleChangeObserver, SessionChange};
use crate::schedule::{configuration_for, locked_group};

/// Request to create a one-off session on a civil date in the course's
/// timezone.
#[derive(Debug, Clone)]
pub struct CreateSessionContext {
    pub tutorial_group_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: String,
}

/// ## Summary
/// Creates an individual session for a tutorial group.
///
/// The civil date and times are resolved to instants under the course
/// configuration's timezone, then checked against every existing session of
/// the group. Cancelled sessions still occupy their slot.
///
/// ## Errors
/// Returns an error if:
/// - The group or course configuration does not exist
/// - `end_time` is not after `start_time`
/// - The session would overlap an existing session (`SchedulingConflict`)
#[tracing::instrument(skip(conn, observer, ctx), fields(tutorial_group_id = %ctx.tutorial_group_id))]
pub async fn create_session(
    conn: &mut DbConnection<'_>,
    observer: &dyn ScheduleChangeObserver,
    ctx: &CreateSessionContext,
) -> ServiceResult<Session> {
    let ctx = ctx.clone();

    let session = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let group = locked_group(tx, ctx.tutorial_group_id).await?;
                let configuration = configuration_for(tx, group.course_id).await?;

                if ctx.end_time <= ctx.start_time {
                    return Err(CalError::InvalidSchedule(format!(
                        "session end {} is not after start {}",
                        ctx.end_time, ctx.start_time
                    ))
                    .into());
                }

                let tz = cal::resolve_timezone(&configuration.time_zone)?;
                let (starts_at, ends_at) =
                    cal::occurrence_instants(ctx.date, ctx.start_time, ctx.end_time, tz);

                let existing = session_query::by_group(tx, group.id).await?;
                if let Some(clash) = existing
                    .iter()
                    .find(|session| cal::overlaps(starts_at, ends_at, session.starts_at, session.ends_at))
                {
                    return Err(CalError::SchedulingConflict {
                        date: ctx.date,
                        session_id: clash.id,
                    }
                    .into());
                }

                let session = session_query::create(
                    tx,
                    &NewSession {
                        tutorial_group_id: group.id,
                        schedule_id: None,
                        starts_at,
                        ends_at,
                        location: &ctx.location,
                        status: tutorium_core::types::SessionStatus::Active.into(),
                        status_explanation: None,
                    },
                )
                .await?;

                Ok(session)
            }
            .scope_boxed()
        })
        .await?;

    observer.sessions_changed(&SessionChange {
        created: 1,
        ..SessionChange::none(session.tutorial_group_id)
    });
    Ok(session)
}

/// ## Summary
/// Cancels a session in place, recording why. The row survives so the slot
/// stays visible (and occupied for conflict purposes).
///
/// ## Errors
/// Returns an error if the session does not exist.
#[tracing::instrument(skip(conn, observer, explanation))]
pub async fn cancel_session(
    conn: &mut DbConnection<'_>,
    observer: &dyn ScheduleChangeObserver,
    session_id: Uuid,
    explanation: &str,
) -> ServiceResult<Session> {
    let explanation = explanation.to_owned();

    let session = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let session = require_session(tx, session_id).await?;
                locked_group(tx, session.tutorial_group_id).await?;

                let updated = session_query::set_status(
                    tx,
                    session.id,
                    tutorium_core::types::SessionStatus::Cancelled.into(),
                    Some(&explanation),
                )
                .await?;
                Ok(updated)
            }
            .scope_boxed()
        })
        .await?;

    observer.sessions_changed(&SessionChange {
        cancelled: 1,
        ..SessionChange::none(session.tutorial_group_id)
    });
    Ok(session)
}

/// ## Summary
/// Reactivates a cancelled session and clears its explanation.
///
/// ## Errors
/// Returns an error if the session does not exist.
#[tracing::instrument(skip(conn, observer))]
pub async fn reactivate_session(
    conn: &mut DbConnection<'_>,
    observer: &dyn ScheduleChangeObserver,
    session_id: Uuid,
) -> ServiceResult<Session> {
    let session = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let session = require_session(tx, session_id).await?;
                locked_group(tx, session.tutorial_group_id).await?;

                let updated = session_query::set_status(
                    tx,
                    session.id,
                    tutorium_core::types::SessionStatus::Active.into(),
                    None,
                )
                .await?;
                Ok(updated)
            }
            .scope_boxed()
        })
        .await?;

    observer.sessions_changed(&SessionChange {
        reactivated: 1,
        ..SessionChange::none(session.tutorial_group_id)
    });
    Ok(session)
}

/// ## Summary
/// Deletes one session permanently. Works for generated and individual
/// sessions alike; a deleted generated session reappears on the next
/// regeneration of its schedule.
///
/// ## Errors
/// Returns an error if the session does not exist.
#[tracing::instrument(skip(conn, observer))]
pub async fn delete_session(
    conn: &mut DbConnection<'_>,
    observer: &dyn ScheduleChangeObserver,
    session_id: Uuid,
) -> ServiceResult<()> {
    let group_id = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let session = require_session(tx, session_id).await?;
                locked_group(tx, session.tutorial_group_id).await?;

                session_query::delete(tx, session.id).await?;
                Ok(session.tutorial_group_id)
            }
            .scope_boxed()
        })
        .await?;

    observer.sessions_changed(&SessionChange {
        deleted: 1,
        ..SessionChange::none(group_id)
    });
    Ok(())
}

async fn require_session(tx: &mut DbConnection<'_>, session_id: Uuid) -> ServiceResult<Session> {
    session_query::find(tx, session_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session {session_id}")))
}
