use diesel::{pg::Pg, prelude::*};
use tutorium_cal::cal::ExistingSession;

use crate::db::{enums::SessionStatus, schema};

/// One concrete dated meeting of a tutorial group.
///
/// `schedule_id` is the back-reference to the generating schedule; `None`
/// marks an individual (manually created) session, which schedule changes
/// must never delete.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::tutorial_group_session)]
#[diesel(check_for_backend(Pg))]
pub struct Session {
    pub id: uuid::Uuid,
    pub tutorial_group_id: uuid::Uuid,
    pub schedule_id: Option<uuid::Uuid>,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub ends_at: chrono::DateTime<chrono::Utc>,
    pub location: String,
    pub status: SessionStatus,
    pub status_explanation: Option<String>,
}

impl Session {
    /// Reduces the row to the view the reconciliation planner works on.
    #[must_use]
    pub fn planning_view(&self) -> ExistingSession {
        ExistingSession {
            id: self.id,
            start: self.starts_at,
            end: self.ends_at,
            schedule_generated: self.schedule_id.is_some(),
        }
    }

    #[must_use]
    pub const fn is_individual(&self) -> bool {
        self.schedule_id.is_none()
    }
}

/// Insert struct for creating new sessions.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::tutorial_group_session)]
pub struct NewSession<'a> {
    pub tutorial_group_id: uuid::Uuid,
    pub schedule_id: Option<uuid::Uuid>,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub ends_at: chrono::DateTime<chrono::Utc>,
    pub location: &'a str,
    pub status: SessionStatus,
    pub status_explanation: Option<&'a str>,
}
