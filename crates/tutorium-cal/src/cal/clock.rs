//! Civil wall-clock to absolute instant conversion.
//!
//! Occurrence times are stored as a civil date plus local start/end times and
//! interpreted in the course's IANA timezone. Across DST transitions the
//! wall-clock time is preserved and the UTC offset changes.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

use crate::error::{CalError, CalResult};

/// Upper bound for the forward scan out of a DST gap. No real timezone has a
/// gap anywhere near this long (the largest on record is a few hours).
const GAP_SCAN_LIMIT_MINUTES: i64 = 24 * 60;

/// ## Summary
/// Resolves an IANA timezone name (e.g. `Europe/Berlin`).
///
/// ## Errors
/// Returns `CalError::InvalidTimezone` if the name is not a known IANA zone.
pub fn resolve_timezone(name: &str) -> CalResult<Tz> {
    Tz::from_str(name).map_err(|_| CalError::InvalidTimezone(name.to_owned()))
}

/// ## Summary
/// Computes the absolute start and end instants of an occurrence on `date`
/// with the given local wall-clock times in `tz`.
///
/// DST edge cases never fail: a nonexistent local time (spring-forward gap)
/// resolves to the nearest valid instant after the gap, and an ambiguous
/// local time (fall-back fold) resolves to its first occurrence.
#[must_use]
pub fn occurrence_instants(
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    tz: Tz,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        zoned_instant(date.and_time(start_time), tz),
        zoned_instant(date.and_time(end_time), tz),
    )
}

/// ## Summary
/// Resolves a naive local datetime to the absolute instant it denotes in
/// `tz`, with the same DST gap/fold handling as [`occurrence_instants`].
#[must_use]
pub fn zoned_instant(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        // DST fold: the wall-clock time occurs twice, take the first.
        LocalResult::Ambiguous(earliest, _latest) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            // DST gap: the wall-clock time does not exist. Scan forward one
            // minute at a time to the first valid local time after the gap.
            let mut probe = local;
            for _ in 0..GAP_SCAN_LIMIT_MINUTES {
                probe += Duration::minutes(1);
                match tz.from_local_datetime(&probe) {
                    LocalResult::Single(dt) => return dt.with_timezone(&Utc),
                    LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
                    LocalResult::None => {}
                }
            }
            // Unreachable for any IANA zone; fall back to reading the naive
            // value as UTC rather than failing.
            tracing::warn!(%local, %tz, "no valid local time found after DST gap");
            DateTime::from_naive_utc_and_offset(local, Utc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn time(h: u32, min: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, min, 0).expect("valid time")
    }

    fn berlin() -> Tz {
        resolve_timezone("Europe/Berlin").expect("known zone")
    }

    #[test_log::test]
    fn test_resolve_timezone_unknown() {
        let err = resolve_timezone("Mars/Olympus_Mons").expect_err("must fail");
        assert!(matches!(err, CalError::InvalidTimezone(name) if name == "Mars/Olympus_Mons"));
    }

    #[test_log::test]
    fn test_instants_before_spring_forward() {
        // 2024-03-25 is the Monday before the Berlin spring-forward (CET, +01:00).
        let (start, end) = occurrence_instants(date(2024, 3, 25), time(10, 0), time(11, 0), berlin());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 25, 9, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 25, 10, 0, 0).unwrap());
    }

    #[test_log::test]
    fn test_instants_after_spring_forward_preserve_wall_clock() {
        // Berlin springs forward on Sunday 2024-03-31; the following Monday is
        // CEST (+02:00). Wall clock stays 10:00-11:00, offset changes.
        let (start, end) = occurrence_instants(date(2024, 4, 1), time(10, 0), time(11, 0), berlin());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap());
        assert_eq!(end - start, Duration::hours(1));
    }

    #[test_log::test]
    fn test_gap_resolves_to_first_instant_after_gap() {
        // 02:30 does not exist on 2024-03-31 in Berlin (02:00 jumps to 03:00).
        // The nearest valid local time is 03:00 CEST == 01:00 UTC.
        let (start, _) = occurrence_instants(date(2024, 3, 31), time(2, 30), time(3, 30), berlin());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 31, 1, 0, 0).unwrap());
    }

    #[test_log::test]
    fn test_fold_resolves_to_first_occurrence() {
        // 02:30 occurs twice on 2024-10-27 in Berlin; the first occurrence is
        // still CEST (+02:00), so 02:30 local == 00:30 UTC.
        let (start, _) = occurrence_instants(date(2024, 10, 27), time(2, 30), time(3, 30), berlin());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap());
    }

    #[test_log::test]
    fn test_plain_day_in_utc_zone() {
        let tz = resolve_timezone("UTC").expect("known zone");
        let (start, end) = occurrence_instants(date(2024, 5, 6), time(14, 15), time(15, 45), tz);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 6, 14, 15, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 5, 6, 15, 45, 0).unwrap());
    }
}
