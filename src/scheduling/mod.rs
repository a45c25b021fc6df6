//! Booking core: schedule building, slot validation, the appointment
//! lifecycle, the public booked-slot view and review linkage.
//!
//! Everything here is pure; the `services` layer loads and stores documents
//! around these types.

pub mod appointment;
pub mod projection;
pub mod review;
pub mod schedule;
pub mod validator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open `[start, end)` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}
