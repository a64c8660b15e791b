use chrono::Weekday;
use diesel::{pg::Pg, prelude::*};
use tutorium_cal::cal::Recurrence;
use tutorium_cal::error::{CalError, CalResult};

use crate::db::schema;

/// The persisted recurrence rule of a tutorial group.
///
/// `day_of_week` is ISO numbering (1 = Monday .. 7 = Sunday).
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::tutorial_group_schedule)]
#[diesel(check_for_backend(Pg))]
pub struct Schedule {
    pub id: uuid::Uuid,
    pub tutorial_group_id: uuid::Uuid,
    pub day_of_week: i16,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub location: String,
    pub valid_from: chrono::NaiveDate,
    pub valid_to: chrono::NaiveDate,
    pub repetition_frequency: i32,
}

impl Schedule {
    /// ## Summary
    /// Snapshots the occurrence-affecting fields as an immutable value for
    /// expansion and the regeneration diff.
    ///
    /// ## Errors
    /// Returns `CalError::InvalidSchedule` if the persisted row is outside the
    /// domain (day of week not 1-7, non-positive repetition frequency).
    pub fn recurrence(&self) -> CalResult<Recurrence> {
        let weekday = weekday_from_iso(self.day_of_week).ok_or_else(|| {
            CalError::InvalidSchedule(format!("day of week {} out of range", self.day_of_week))
        })?;
        let interval_weeks = u32::try_from(self.repetition_frequency).map_err(|_| {
            CalError::InvalidSchedule(format!(
                "repetition frequency {} out of range",
                self.repetition_frequency
            ))
        })?;

        Ok(Recurrence {
            weekday,
            start_time: self.start_time,
            end_time: self.end_time,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            interval_weeks,
        })
    }
}

/// Converts an ISO day number (1 = Monday) to a weekday.
#[must_use]
pub fn weekday_from_iso(day: i16) -> Option<Weekday> {
    match day {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Converts a weekday to its ISO day number (1 = Monday).
#[must_use]
pub fn iso_from_weekday(weekday: Weekday) -> i16 {
    // number_from_monday is 1-7, always in i16 range
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    {
        weekday.number_from_monday() as i16
    }
}

/// Insert struct for creating a new schedule.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::tutorial_group_schedule)]
pub struct NewSchedule<'a> {
    pub tutorial_group_id: uuid::Uuid,
    pub day_of_week: i16,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub location: &'a str,
    pub valid_from: chrono::NaiveDate,
    pub valid_to: chrono::NaiveDate,
    pub repetition_frequency: i32,
}

/// Partial update of a schedule; `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::tutorial_group_schedule)]
pub struct ScheduleChangeset<'a> {
    pub day_of_week: Option<i16>,
    pub start_time: Option<chrono::NaiveTime>,
    pub end_time: Option<chrono::NaiveTime>,
    pub location: Option<&'a str>,
    pub valid_from: Option<chrono::NaiveDate>,
    pub valid_to: Option<chrono::NaiveDate>,
    pub repetition_frequency: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_iso_weekday_round_trip() {
        for day in 1..=7_i16 {
            let weekday = weekday_from_iso(day).expect("in range");
            assert_eq!(iso_from_weekday(weekday), day);
        }
        assert!(weekday_from_iso(0).is_none());
        assert!(weekday_from_iso(8).is_none());
    }

    #[test_log::test]
    fn test_recurrence_rejects_out_of_range_row() {
        let schedule = Schedule {
            id: uuid::Uuid::new_v4(),
            tutorial_group_id: uuid::Uuid::new_v4(),
            day_of_week: 9,
            start_time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: chrono::NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            location: "H 0104".to_owned(),
            valid_from: chrono::NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            valid_to: chrono::NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            repetition_frequency: 1,
        };
        assert!(matches!(
            schedule.recurrence(),
            Err(CalError::InvalidSchedule(_))
        ));
    }
}
