use diesel::{pg::Pg, prelude::*};
use tutorium_cal::cal::BoundingPeriod;

use crate::db::schema;

/// Course-wide scheduling bounds: effective timezone and tutorial period.
///
/// At most one configuration exists per course (unique `course_id`).
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::course_schedule_configuration)]
#[diesel(check_for_backend(Pg))]
pub struct CourseScheduleConfiguration {
    pub id: uuid::Uuid,
    pub course_id: uuid::Uuid,
    pub time_zone: String,
    pub period_start: chrono::NaiveDate,
    pub period_end: chrono::NaiveDate,
}

impl CourseScheduleConfiguration {
    /// The bounding period clipping every group's validity window.
    #[must_use]
    pub const fn bounding_period(&self) -> BoundingPeriod {
        BoundingPeriod {
            start: self.period_start,
            end: self.period_end,
        }
    }
}

/// Insert struct for creating a course schedule configuration.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::course_schedule_configuration)]
pub struct NewCourseScheduleConfiguration<'a> {
    pub course_id: uuid::Uuid,
    pub time_zone: &'a str,
    pub period_start: chrono::NaiveDate,
    pub period_end: chrono::NaiveDate,
}

/// Partial update of a configuration; `None` fields are left untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::course_schedule_configuration)]
pub struct ConfigurationChangeset<'a> {
    pub time_zone: Option<&'a str>,
    pub period_start: Option<chrono::NaiveDate>,
    pub period_end: Option<chrono::NaiveDate>,
}
