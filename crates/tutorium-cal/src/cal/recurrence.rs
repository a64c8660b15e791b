//! Weekly recurrence expansion.
//!
//! A schedule repeats on one weekday every `interval_weeks` weeks inside its
//! validity window, further clipped by the course-wide bounding period.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};

use crate::error::{CalError, CalResult};

/// The occurrence-affecting fields of a schedule, snapshotted as a value.
///
/// Equality over this type is exactly the "does the update require
/// regeneration" question (see [`crate::cal::policy`]); the location label is
/// deliberately not part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// First civil date of the validity window (inclusive).
    pub valid_from: NaiveDate,
    /// Last civil date of the validity window (inclusive).
    pub valid_to: NaiveDate,
    /// Weeks between occurrences; 1 = weekly.
    pub interval_weeks: u32,
}

/// Course-wide bounding period (inclusive civil dates).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Recurrence {
    /// ## Summary
    /// Checks the rule for structural validity.
    ///
    /// ## Errors
    /// Returns `CalError::InvalidSchedule` if the repetition interval is zero,
    /// the end time is not after the start time, or the validity window is
    /// inverted.
    pub fn validate(&self) -> CalResult<()> {
        if self.interval_weeks < 1 {
            return Err(CalError::InvalidSchedule(
                "repetition frequency must be at least 1 week".to_owned(),
            ));
        }
        if self.end_time <= self.start_time {
            return Err(CalError::InvalidSchedule(format!(
                "end time {} must be after start time {}",
                self.end_time, self.start_time
            )));
        }
        if self.valid_from > self.valid_to {
            return Err(CalError::InvalidSchedule(format!(
                "validity window starts {} after it ends {}",
                self.valid_from, self.valid_to
            )));
        }
        Ok(())
    }
}

/// ## Summary
/// Expands a recurrence rule into the ascending civil dates on which an
/// occurrence exists.
///
/// The effective window is the intersection of the rule's validity window and
/// the bounding period; an empty intersection yields an empty vector. The
/// first emitted date is the first one on/after the window start matching the
/// rule's weekday, then every `interval_weeks * 7` days while inside the
/// window.
///
/// ## Errors
/// Returns `CalError::InvalidSchedule` if the rule fails [`Recurrence::validate`].
pub fn expand(recurrence: &Recurrence, bounds: &BoundingPeriod) -> CalResult<Vec<NaiveDate>> {
    recurrence.validate()?;

    let window_start = recurrence.valid_from.max(bounds.start);
    let window_end = recurrence.valid_to.min(bounds.end);
    if window_start > window_end {
        return Ok(Vec::new());
    }

    let days_until_weekday = (recurrence.weekday.num_days_from_monday() + 7
        - window_start.weekday().num_days_from_monday())
        % 7;
    let Some(mut date) = window_start.checked_add_days(Days::new(u64::from(days_until_weekday)))
    else {
        return Ok(Vec::new());
    };

    let stride = Days::new(u64::from(recurrence.interval_weeks) * 7);
    let mut dates = Vec::new();
    while date <= window_end {
        dates.push(date);
        match date.checked_add_days(stride) {
            Some(next) => date = next,
            None => break,
        }
    }

    tracing::trace!(
        count = dates.len(),
        %window_start,
        %window_end,
        "expanded recurrence"
    );
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).expect("valid time")
    }

    fn weekly_monday(valid_from: NaiveDate, valid_to: NaiveDate, interval_weeks: u32) -> Recurrence {
        Recurrence {
            weekday: Weekday::Mon,
            start_time: time(10),
            end_time: time(11),
            valid_from,
            valid_to,
            interval_weeks,
        }
    }

    fn wide_bounds() -> BoundingPeriod {
        BoundingPeriod {
            start: date(2024, 1, 1),
            end: date(2024, 12, 31),
        }
    }

    #[test_log::test]
    fn test_weekly_expansion() {
        // 2024-03-25, 2024-04-01 and 2024-04-08 are Mondays.
        let rec = weekly_monday(date(2024, 3, 25), date(2024, 4, 8), 1);
        let dates = expand(&rec, &wide_bounds()).expect("valid rule");
        assert_eq!(
            dates,
            vec![date(2024, 3, 25), date(2024, 4, 1), date(2024, 4, 8)]
        );
    }

    #[test_log::test]
    fn test_biweekly_stride_over_three_week_window() {
        // 2024-01-01 is a Monday; a 3-week window with interval 2 yields
        // exactly two dates, 14 days apart.
        let rec = weekly_monday(date(2024, 1, 1), date(2024, 1, 15), 2);
        let dates = expand(&rec, &wide_bounds()).expect("valid rule");
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 15)]);
    }

    #[test_log::test]
    fn test_first_date_skips_to_matching_weekday() {
        // Window starts on Tuesday 2024-01-02; the first Monday inside it is
        // 2024-01-08.
        let rec = weekly_monday(date(2024, 1, 2), date(2024, 1, 8), 1);
        let dates = expand(&rec, &wide_bounds()).expect("valid rule");
        assert_eq!(dates, vec![date(2024, 1, 8)]);
    }

    #[test_log::test]
    fn test_bounding_period_clips_validity_window() {
        let rec = weekly_monday(date(2024, 3, 25), date(2024, 4, 8), 1);
        let bounds = BoundingPeriod {
            start: date(2024, 4, 1),
            end: date(2024, 4, 1),
        };
        let dates = expand(&rec, &bounds).expect("valid rule");
        assert_eq!(dates, vec![date(2024, 4, 1)]);
    }

    #[test_log::test]
    fn test_empty_intersection_is_not_an_error() {
        let rec = weekly_monday(date(2024, 3, 25), date(2024, 4, 8), 1);
        let bounds = BoundingPeriod {
            start: date(2024, 6, 1),
            end: date(2024, 6, 30),
        };
        let dates = expand(&rec, &bounds).expect("valid rule");
        assert!(dates.is_empty());
    }

    #[test_log::test]
    fn test_single_day_window_matching_weekday() {
        let rec = weekly_monday(date(2024, 4, 1), date(2024, 4, 1), 1);
        let dates = expand(&rec, &wide_bounds()).expect("valid rule");
        assert_eq!(dates, vec![date(2024, 4, 1)]);
    }

    #[test_log::test]
    fn test_zero_interval_rejected() {
        let rec = weekly_monday(date(2024, 1, 1), date(2024, 1, 15), 0);
        let err = expand(&rec, &wide_bounds()).expect_err("must fail");
        assert!(matches!(err, CalError::InvalidSchedule(_)));
    }

    #[test_log::test]
    fn test_end_time_before_start_time_rejected() {
        let mut rec = weekly_monday(date(2024, 1, 1), date(2024, 1, 15), 1);
        rec.end_time = time(9);
        assert!(matches!(
            rec.validate(),
            Err(CalError::InvalidSchedule(_))
        ));
    }

    #[test_log::test]
    fn test_inverted_validity_window_rejected() {
        let rec = weekly_monday(date(2024, 1, 15), date(2024, 1, 1), 1);
        assert!(matches!(
            rec.validate(),
            Err(CalError::InvalidSchedule(_))
        ));
    }
}
