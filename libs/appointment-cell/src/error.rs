use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Appointment id already exists: {0}")]
    DuplicateId(String),

    #[error("Doctor {doctor_id} is not available at {time}")]
    DoctorUnavailable { doctor_id: String, time: i64 },

    #[error("Appointment already booked at {time} for the same patient and doctor")]
    TimeConflict { time: i64 },

    #[error("Appointment not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Appointment {0} was already rejected")]
    AlreadyRejected(String),

    #[error("Invalid time range: end {end} precedes start {start}")]
    InvalidRange { start: i64, end: i64 },

    #[error("No upcoming appointments in the reminder queue")]
    QueueEmpty,
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        let message = err.to_string();
        match err {
            SchedulingError::DuplicateId(_)
            | SchedulingError::DoctorUnavailable { .. }
            | SchedulingError::TimeConflict { .. }
            | SchedulingError::AlreadyRejected(_) => AppError::Conflict(message),
            SchedulingError::NotFound(_) | SchedulingError::QueueEmpty => {
                AppError::NotFound(message)
            }
            SchedulingError::PermissionDenied(_) => AppError::Forbidden(message),
            SchedulingError::InvalidRange { .. } => AppError::BadRequest(message),
        }
    }
}
