//! Pure half of the session reconciler.
//!
//! Given the desired occurrences derived from a schedule and the sessions
//! currently persisted for the tutorial group, this module decides which
//! sessions to create and which to delete. The service layer applies the
//! resulting plan inside a single transaction; nothing here touches storage.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tutorium_core::types::SessionStatus;
use uuid::Uuid;

use super::clock::occurrence_instants;
use super::free_period::FreePeriodIndex;
use super::recurrence::{BoundingPeriod, Recurrence, expand};
use crate::error::{CalError, CalResult};

/// One desired dated occurrence of a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: SessionStatus,
    /// Free-period reason when the occurrence is generated cancelled.
    pub status_explanation: Option<String>,
}

/// Minimal view of a persisted session needed for planning.
///
/// `schedule_generated` is the presence of the schedule back-reference:
/// false means the session was created individually by a user and must
/// survive any schedule change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingSession {
    pub id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub schedule_generated: bool,
}

/// Result of planning a schedule (re)generation for one tutorial group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationPlan {
    /// Sessions to persist, in occurrence order.
    pub create: Vec<Occurrence>,
    /// Ids of schedule-generated sessions to delete before creating.
    pub delete: Vec<Uuid>,
}

/// Half-open interval overlap; back-to-back intervals do not overlap.
#[must_use]
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// ## Summary
/// Assembles the desired occurrence list for a schedule: expands the
/// recurrence over the bounding period, converts each date to zoned instants,
/// and tags occurrences whose start instant falls inside a free period as
/// cancelled with the period's reason.
///
/// ## Errors
/// Returns `CalError::InvalidSchedule` for a structurally invalid rule, or
/// when an occurrence's local window lies wholly inside a spring-forward gap
/// and both instants resolve to the same point (the meeting has no duration
/// on that date).
pub fn build_occurrences(
    recurrence: &Recurrence,
    bounds: &BoundingPeriod,
    tz: Tz,
    free_periods: &FreePeriodIndex,
) -> CalResult<Vec<Occurrence>> {
    let dates = expand(recurrence, bounds)?;

    let mut occurrences = Vec::with_capacity(dates.len());
    for date in dates {
        let (start, end) =
            occurrence_instants(date, recurrence.start_time, recurrence.end_time, tz);
        if start >= end {
            return Err(CalError::InvalidSchedule(format!(
                "occurrence on {date} collapses to an empty interval across a daylight saving transition"
            )));
        }

        occurrences.push(match free_periods.covering(start) {
            Some(period) => Occurrence {
                date,
                start,
                end,
                status: SessionStatus::Cancelled,
                status_explanation: Some(period.reason.clone()),
            },
            None => Occurrence {
                date,
                start,
                end,
                status: SessionStatus::Active,
                status_explanation: None,
            },
        });
    }

    Ok(occurrences)
}

/// ## Summary
/// Plans the reconciliation of `desired` occurrences against the group's
/// `existing` sessions.
///
/// Every existing schedule-generated session is marked for deletion (empty on
/// first creation) and every desired occurrence for creation. Individual
/// sessions are never deleted; instead, any desired occurrence overlapping
/// one rejects the whole request, so the caller persists either the full plan
/// or nothing.
///
/// ## Errors
/// Returns `CalError::SchedulingConflict` naming the first conflicting
/// occurrence date and individual session.
pub fn plan_generation(
    desired: &[Occurrence],
    existing: &[ExistingSession],
) -> CalResult<GenerationPlan> {
    for occurrence in desired {
        let conflict = existing.iter().find(|session| {
            !session.schedule_generated
                && overlaps(occurrence.start, occurrence.end, session.start, session.end)
        });
        if let Some(session) = conflict {
            return Err(CalError::SchedulingConflict {
                date: occurrence.date,
                session_id: session.id,
            });
        }
    }

    let delete: Vec<Uuid> = existing
        .iter()
        .filter(|session| session.schedule_generated)
        .map(|session| session.id)
        .collect();

    tracing::debug!(
        create = desired.len(),
        delete = delete.len(),
        "planned schedule generation"
    );

    Ok(GenerationPlan {
        create: desired.to_vec(),
        delete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cal::free_period::FreePeriod;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn berlin() -> Tz {
        crate::cal::clock::resolve_timezone("Europe/Berlin").expect("known zone")
    }

    fn weekly_monday(valid_from: NaiveDate, valid_to: NaiveDate) -> Recurrence {
        Recurrence {
            weekday: Weekday::Mon,
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            valid_from,
            valid_to,
            interval_weeks: 1,
        }
    }

    fn wide_bounds() -> BoundingPeriod {
        BoundingPeriod {
            start: date(2024, 1, 1),
            end: date(2024, 12, 31),
        }
    }

    fn session(start: DateTime<Utc>, end: DateTime<Utc>, generated: bool) -> ExistingSession {
        ExistingSession {
            id: Uuid::new_v4(),
            start,
            end,
            schedule_generated: generated,
        }
    }

    #[test_log::test]
    fn test_single_matching_day_round_trips_through_calendar_math() {
        let rec = weekly_monday(date(2024, 4, 1), date(2024, 4, 1));
        let occurrences =
            build_occurrences(&rec, &wide_bounds(), berlin(), &FreePeriodIndex::default())
                .expect("valid rule");

        assert_eq!(occurrences.len(), 1);
        let (start, end) =
            occurrence_instants(date(2024, 4, 1), rec.start_time, rec.end_time, berlin());
        assert_eq!(occurrences[0].start, start);
        assert_eq!(occurrences[0].end, end);
        assert_eq!(occurrences[0].status, SessionStatus::Active);
    }

    #[test_log::test]
    fn test_free_period_cancels_covered_occurrence() {
        let rec = weekly_monday(date(2024, 4, 1), date(2024, 4, 8));
        let index = FreePeriodIndex::new(vec![FreePeriod {
            id: Uuid::new_v4(),
            start: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap(),
            reason: "public holiday".to_owned(),
        }]);

        let occurrences =
            build_occurrences(&rec, &wide_bounds(), berlin(), &index).expect("valid rule");

        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].status, SessionStatus::Cancelled);
        assert_eq!(
            occurrences[0].status_explanation.as_deref(),
            Some("public holiday")
        );
        assert_eq!(occurrences[1].status, SessionStatus::Active);
        assert!(occurrences[1].status_explanation.is_none());
    }

    #[test_log::test]
    fn test_dst_transition_keeps_one_hour_duration() {
        // Mondays 2024-03-25 (CET) and 2024-04-01 (CEST) straddle the Berlin
        // spring-forward on Sunday 2024-03-31.
        let rec = weekly_monday(date(2024, 3, 25), date(2024, 4, 1));
        let occurrences =
            build_occurrences(&rec, &wide_bounds(), berlin(), &FreePeriodIndex::default())
                .expect("valid rule");

        assert_eq!(occurrences.len(), 2);
        assert_eq!(
            occurrences[0].start,
            Utc.with_ymd_and_hms(2024, 3, 25, 9, 0, 0).unwrap()
        );
        assert_eq!(
            occurrences[1].start,
            Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
        );
        for occurrence in &occurrences {
            assert_eq!(occurrence.end - occurrence.start, chrono::Duration::hours(1));
        }
    }

    #[test_log::test]
    fn test_window_swallowed_by_spring_forward_gap_is_rejected() {
        // 02:30-03:00 does not exist on 2024-03-31 in Berlin; both bounds
        // resolve to 03:00 CEST and the occurrence has no duration.
        let rec = Recurrence {
            weekday: Weekday::Sun,
            start_time: NaiveTime::from_hms_opt(2, 30, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(3, 0, 0).unwrap(),
            valid_from: date(2024, 3, 31),
            valid_to: date(2024, 3, 31),
            interval_weeks: 1,
        };

        let err = build_occurrences(&rec, &wide_bounds(), berlin(), &FreePeriodIndex::default())
            .expect_err("must fail");
        assert!(matches!(err, CalError::InvalidSchedule(_)));
    }

    #[test_log::test]
    fn test_plan_deletes_generated_and_keeps_individual_sessions() {
        let rec = weekly_monday(date(2024, 4, 1), date(2024, 4, 8));
        let desired =
            build_occurrences(&rec, &wide_bounds(), berlin(), &FreePeriodIndex::default())
                .expect("valid rule");

        let generated = session(
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            true,
        );
        let individual = session(
            Utc.with_ymd_and_hms(2024, 4, 3, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 3, 10, 0, 0).unwrap(),
            false,
        );

        let plan = plan_generation(&desired, &[generated, individual]).expect("no conflict");
        assert_eq!(plan.create.len(), 2);
        assert_eq!(plan.delete, vec![generated.id]);
    }

    #[test_log::test]
    fn test_conflict_with_individual_session_rejects_whole_plan() {
        let rec = weekly_monday(date(2024, 4, 1), date(2024, 4, 15));
        let desired =
            build_occurrences(&rec, &wide_bounds(), berlin(), &FreePeriodIndex::default())
                .expect("valid rule");
        assert_eq!(desired.len(), 3);

        // Overlaps the middle occurrence only; the whole request still fails.
        let individual = session(
            Utc.with_ymd_and_hms(2024, 4, 8, 8, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 8, 9, 30, 0).unwrap(),
            false,
        );

        let err = plan_generation(&desired, &[individual]).expect_err("must conflict");
        match err {
            CalError::SchedulingConflict { date: day, session_id } => {
                assert_eq!(day, date(2024, 4, 8));
                assert_eq!(session_id, individual.id);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test_log::test]
    fn test_back_to_back_with_individual_session_is_not_a_conflict() {
        let rec = weekly_monday(date(2024, 4, 1), date(2024, 4, 1));
        let desired =
            build_occurrences(&rec, &wide_bounds(), berlin(), &FreePeriodIndex::default())
                .expect("valid rule");

        // Ends exactly when the occurrence starts (08:00 UTC on 2024-04-01).
        let individual = session(
            Utc.with_ymd_and_hms(2024, 4, 1, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap(),
            false,
        );

        let plan = plan_generation(&desired, &[individual]).expect("no conflict");
        assert_eq!(plan.create.len(), 1);
        assert!(plan.delete.is_empty());
    }

    #[test_log::test]
    fn test_cancelled_occurrence_still_conflicts_with_individual_session() {
        // Free-period exclusion cancels, it does not remove the occurrence;
        // the interval is still claimed by the schedule.
        let rec = weekly_monday(date(2024, 4, 1), date(2024, 4, 1));
        let index = FreePeriodIndex::new(vec![FreePeriod {
            id: Uuid::new_v4(),
            start: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap(),
            reason: "public holiday".to_owned(),
        }]);
        let desired = build_occurrences(&rec, &wide_bounds(), berlin(), &index).expect("valid");

        let individual = session(
            Utc.with_ymd_and_hms(2024, 4, 1, 8, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap(),
            false,
        );

        assert!(plan_generation(&desired, &[individual]).is_err());
    }

    #[test_log::test]
    fn test_timezone_change_recomputes_instants() {
        // The same civil schedule produces different instants under a
        // different course timezone; wall-clock time is what is preserved.
        let rec = weekly_monday(date(2024, 4, 1), date(2024, 4, 1));
        let helsinki = crate::cal::clock::resolve_timezone("Europe/Helsinki").expect("known zone");

        let under_berlin =
            build_occurrences(&rec, &wide_bounds(), berlin(), &FreePeriodIndex::default())
                .expect("valid rule");
        let under_helsinki =
            build_occurrences(&rec, &wide_bounds(), helsinki, &FreePeriodIndex::default())
                .expect("valid rule");

        assert_eq!(
            under_berlin[0].start,
            Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
        );
        assert_eq!(
            under_helsinki[0].start,
            Utc.with_ymd_and_hms(2024, 4, 1, 7, 0, 0).unwrap()
        );
    }
}
