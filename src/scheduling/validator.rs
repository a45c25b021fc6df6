// src/scheduling/validator.rs

use chrono::{DateTime, NaiveDate, Utc};

use crate::calendar::ShopCalendar;

use super::TimeWindow;
use super::schedule::{BarberAvailability, SLOT_MINUTES};

/// Why a requested window cannot be booked. Carries enough context for the
/// caller to log; only the display text goes back to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotRejection {
    #[error("end time must be after start time")]
    EmptyWindow,

    #[error("{date} is not a working day")]
    NotWorkingDay { date: NaiveDate },

    #[error("requested time {requested_start} - {requested_end} is outside working hours {work_start} - {work_end}")]
    OutsideWorkingHours {
        requested_start: DateTime<Utc>,
        requested_end: DateTime<Utc>,
        work_start: DateTime<Utc>,
        work_end: DateTime<Utc>,
    },

    #[error("requested time {start} - {end} does not line up with the {SLOT_MINUTES}-minute slots")]
    NotSlotAligned {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl SlotRejection {
    pub fn code(&self) -> &'static str {
        match self {
            SlotRejection::EmptyWindow | SlotRejection::NotSlotAligned { .. } => "VALIDATION_ERROR",
            SlotRejection::NotWorkingDay { .. } => "NOT_A_WORKING_DAY",
            SlotRejection::OutsideWorkingHours { .. } => "OUTSIDE_WORKING_HOURS",
        }
    }
}

/// Checks `window` on shop day `date` against the barber's configured hours
/// and the slot grid they generate. Collisions with other bookings are not
/// checked here.
pub fn validate_slot(
    availability: &BarberAvailability,
    date: NaiveDate,
    window: &TimeWindow,
    calendar: &ShopCalendar,
) -> Result<(), SlotRejection> {
    if window.is_empty() {
        return Err(SlotRejection::EmptyWindow);
    }

    let hours = availability
        .day(date)
        .filter(|d| d.is_working_day)
        .and_then(|d| d.work_hours)
        .ok_or(SlotRejection::NotWorkingDay { date })?;

    // only the time of day is stored, anchor it on the requested day
    let work_start = calendar.at(date, hours.start);
    let work_end = calendar.at(date, hours.end);

    if window.start < work_start || window.end > work_end {
        return Err(SlotRejection::OutsideWorkingHours {
            requested_start: window.start,
            requested_end: window.end,
            work_start,
            work_end,
        });
    }

    let slot_millis = i64::from(SLOT_MINUTES) * 60_000;
    let on_grid = |t: DateTime<Utc>| (t - work_start).num_milliseconds() % slot_millis == 0;
    if !on_grid(window.start) || !on_grid(window.end) {
        return Err(SlotRejection::NotSlotAligned {
            start: window.start,
            end: window.end,
        });
    }
    Ok(())
}
