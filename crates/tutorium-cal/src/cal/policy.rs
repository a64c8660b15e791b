//! Decides whether a schedule update requires occurrence regeneration.

use super::recurrence::Recurrence;

/// ## Summary
/// Returns true iff any occurrence-affecting field differs between the old
/// and new schedule value: weekday, start/end time, validity window, or
/// repetition interval.
///
/// A change restricted to metadata (the location label) never triggers
/// regeneration, so session identities survive such updates. The caller must
/// snapshot `old` before applying the update.
#[must_use]
pub fn requires_regeneration(old: &Recurrence, new: &Recurrence) -> bool {
    old != new
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Weekday};

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
    fn test_identical_values_do_not_regenerate() {
        assert!(!requires_regeneration(&base(), &base()));
    }

    #[test_log::test]
    fn test_each_field_triggers_regeneration() {
        let old = base();

        let mut changed = base();
        changed.weekday = Weekday::Tue;
        assert!(requires_regeneration(&old, &changed));

        let mut changed = base();
        changed.start_time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert!(requires_regeneration(&old, &changed));

        let mut changed = base();
        changed.end_time = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert!(requires_regeneration(&old, &changed));

        let mut changed = base();
        changed.valid_from = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(requires_regeneration(&old, &changed));

        let mut changed = base();
        changed.valid_to = NaiveDate::from_ymd_opt(2024, 7, 8).unwrap();
        assert!(requires_regeneration(&old, &changed));

        let mut changed = base();
        changed.interval_weeks = 2;
        assert!(requires_regeneration(&old, &changed));
    }
}
