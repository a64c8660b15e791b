use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Calendar and reconciliation-planning errors
#[derive(Error, Debug)]
pub enum CalError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error(
        "Scheduling conflict: occurrence on {date} overlaps individual session {session_id}"
    )]
    SchedulingConflict { date: NaiveDate, session_id: Uuid },

    #[error(transparent)]
    CoreError(#[from] tutorium_core::error::CoreError),
}

pub type CalResult<T> = std::result::Result<T, CalError>;
