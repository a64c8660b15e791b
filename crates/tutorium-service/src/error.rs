use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    CalendarError(#[from] tutorium_cal::error::CalError),

    #[error(transparent)]
    DatabaseError(#[from] tutorium_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] tutorium_core::error::CoreError),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
