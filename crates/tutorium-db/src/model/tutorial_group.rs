use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

/// A recurring teaching unit owning at most one schedule and many sessions.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::tutorial_group)]
#[diesel(check_for_backend(Pg))]
pub struct TutorialGroup {
    pub id: uuid::Uuid,
    pub course_id: uuid::Uuid,
    pub title: String,
    pub capacity: Option<i32>,
}
