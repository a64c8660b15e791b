//! Course-wide free periods and containment queries against them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A course-scoped exclusion window with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreePeriod {
    pub id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reason: String,
}

/// Answers whether an instant falls inside any free period of a course.
#[derive(Debug, Clone, Default)]
pub struct FreePeriodIndex {
    periods: Vec<FreePeriod>,
}

impl FreePeriodIndex {
    #[must_use]
    pub fn new(mut periods: Vec<FreePeriod>) -> Self {
        periods.sort_by_key(|p| p.start);
        Self { periods }
    }

    /// Returns the first free period containing `instant`, bounds inclusive.
    #[must_use]
    pub fn covering(&self, instant: DateTime<Utc>) -> Option<&FreePeriod> {
        self.periods
            .iter()
            .find(|p| p.start <= instant && instant <= p.end)
    }

    #[must_use]
    pub fn is_free(&self, instant: DateTime<Utc>) -> bool {
        self.covering(instant).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn period(start_day: u32, end_day: u32, reason: &str) -> FreePeriod {
        FreePeriod {
            id: Uuid::new_v4(),
            start: Utc.with_ymd_and_hms(2024, 4, start_day, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 4, end_day, 23, 59, 59).unwrap(),
            reason: reason.to_owned(),
        }
    }

    #[test_log::test]
    fn test_instant_inside_period() {
        let index = FreePeriodIndex::new(vec![period(1, 7, "spring break")]);
        let instant = Utc.with_ymd_and_hms(2024, 4, 3, 10, 0, 0).unwrap();
        assert!(index.is_free(instant));
        assert_eq!(index.covering(instant).map(|p| p.reason.as_str()), Some("spring break"));
    }

    #[test_log::test]
    fn test_bounds_are_inclusive() {
        let p = period(1, 7, "spring break");
        let index = FreePeriodIndex::new(vec![p.clone()]);
        assert!(index.is_free(p.start));
        assert!(index.is_free(p.end));
    }

    #[test_log::test]
    fn test_instant_outside_any_period() {
        let index = FreePeriodIndex::new(vec![period(1, 7, "spring break"), period(20, 21, "holiday")]);
        let instant = Utc.with_ymd_and_hms(2024, 4, 10, 10, 0, 0).unwrap();
        assert!(!index.is_free(instant));
        assert!(index.covering(instant).is_none());
    }

    #[test_log::test]
    fn test_empty_index() {
        let index = FreePeriodIndex::default();
        assert!(!index.is_free(Utc.with_ymd_and_hms(2024, 4, 3, 10, 0, 0).unwrap()));
    }
}
