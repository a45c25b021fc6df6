// src/scheduling/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Document;

use super::appointment::{Appointment, AppointmentStatus};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub appointment_id: Uuid,
    pub admin_id: Uuid,
    pub rating: u8,
    pub feedback: String,
    pub image: Option<ReviewImage>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Review {
    const COLLECTION: &'static str = "reviews";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("rating must be between 1 and 5")]
    RatingOutOfRange,

    #[error("only completed appointments can be reviewed (current status: {0})")]
    NotCompleted(AppointmentStatus),

    #[error("a review already exists for this appointment")]
    AlreadyExists,
}

pub fn check_rating(rating: u8) -> Result<(), ReviewError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ReviewError::RatingOutOfRange)
    }
}

/// Preconditions for attaching a new review, apart from ownership.
pub fn check_reviewable(appt: &Appointment) -> Result<(), ReviewError> {
    if appt.status != AppointmentStatus::Completed {
        return Err(ReviewError::NotCompleted(appt.status));
    }
    if appt.has_review || appt.review.is_some() {
        return Err(ReviewError::AlreadyExists);
    }
    Ok(())
}

impl Appointment {
    pub fn attach_review(&mut self, review_id: Uuid, now: DateTime<Utc>) {
        self.review = Some(review_id);
        self.has_review = true;
        self.touch(now);
    }

    pub fn detach_review(&mut self, now: DateTime<Utc>) {
        self.review = None;
        self.has_review = false;
        self.touch(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::appointment::tests::appointment;

    #[test]
    fn test_rating_bounds() {
        assert!(check_rating(1).is_ok());
        assert!(check_rating(5).is_ok());
        assert_eq!(check_rating(0), Err(ReviewError::RatingOutOfRange));
        assert_eq!(check_rating(6), Err(ReviewError::RatingOutOfRange));
    }

    #[test]
    fn test_only_completed_unreviewed_appointments() {
        let pending = appointment(AppointmentStatus::Pending);
        assert_eq!(
            check_reviewable(&pending),
            Err(ReviewError::NotCompleted(AppointmentStatus::Pending))
        );

        let mut done = appointment(AppointmentStatus::Completed);
        assert!(check_reviewable(&done).is_ok());
        done.attach_review(Uuid::new_v4(), Utc::now());
        assert!(done.has_review);
        assert_eq!(check_reviewable(&done), Err(ReviewError::AlreadyExists));

        done.detach_review(Utc::now());
        assert!(!done.has_review);
        assert!(done.review.is_none());
    }
}
