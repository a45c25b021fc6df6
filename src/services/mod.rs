//! Store-backed operations of the booking core. Each function loads the
//! documents it needs, runs the pure rules from `scheduling`, and writes the
//! result back, batching related writes through `DocumentStore::transact`.

pub mod appointments;
pub mod availability;
pub mod catalog;
pub mod reviews;

use crate::scheduling::appointment::TransitionError;
use crate::scheduling::review::ReviewError;
use crate::scheduling::schedule::ScheduleError;
use crate::scheduling::validator::SlotRejection;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{message}")]
    Validation { code: &'static str, message: String },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            code: "VALIDATION_ERROR",
            message: message.into(),
        }
    }
}

impl From<SlotRejection> for ServiceError {
    fn from(e: SlotRejection) -> Self {
        ServiceError::Validation {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

impl From<TransitionError> for ServiceError {
    fn from(e: TransitionError) -> Self {
        ServiceError::InvalidState(e.to_string())
    }
}

impl From<ScheduleError> for ServiceError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::SlotTaken(_) => ServiceError::Conflict(e.to_string()),
            _ => ServiceError::validation(e.to_string()),
        }
    }
}

impl From<ReviewError> for ServiceError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::RatingOutOfRange => ServiceError::validation(e.to_string()),
            ReviewError::NotCompleted(_) => ServiceError::InvalidState(e.to_string()),
            ReviewError::AlreadyExists => ServiceError::Conflict(e.to_string()),
        }
    }
}
