use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

/// A course-scoped exclusion window.
///
/// Instants are computed against the course timezone in effect at creation;
/// a timezone change clears all free periods of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::free_period)]
#[diesel(check_for_backend(Pg))]
pub struct FreePeriod {
    pub id: uuid::Uuid,
    pub configuration_id: uuid::Uuid,
    pub period_start: chrono::DateTime<chrono::Utc>,
    pub period_end: chrono::DateTime<chrono::Utc>,
    pub reason: String,
}

impl FreePeriod {
    /// Converts the row into the pure index representation.
    #[must_use]
    pub fn to_cal(&self) -> tutorium_cal::cal::FreePeriod {
        tutorium_cal::cal::FreePeriod {
            id: self.id,
            start: self.period_start,
            end: self.period_end,
            reason: self.reason.clone(),
        }
    }
}

/// Insert struct for creating a new free period.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::free_period)]
pub struct NewFreePeriod<'a> {
    pub configuration_id: uuid::Uuid,
    pub period_start: chrono::DateTime<chrono::Utc>,
    pub period_end: chrono::DateTime<chrono::Utc>,
    pub reason: &'a str,
}
