// src/scheduling/schedule.rs

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::ShopCalendar;
use crate::store::Document;

use super::TimeWindow;

pub const SLOT_MINUTES: u32 = 30;
const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("day {day} does not exist in {year}-{month:02}")]
    InvalidDay { year: i32, month: u32, day: u32 },

    #[error("working hours must end by 23:30")]
    EndsPastMidnight,

    #[error("working hours {start}-{end} leave no bookable slot")]
    EmptyRange { start: NaiveTime, end: NaiveTime },

    #[error("slot {0} is already booked")]
    SlotTaken(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentMonth {
    pub month: u32,
    pub year: i32,
    pub is_set: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub appointment_id: Option<Uuid>,
}

impl TimeSlot {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub is_working_day: bool,
    pub work_hours: Option<WorkHours>,
    pub time_slots: Vec<TimeSlot>,
}

impl ScheduleDay {
    fn non_working(date: NaiveDate) -> Self {
        Self {
            date,
            is_working_day: false,
            work_hours: None,
            time_slots: vec![],
        }
    }

    fn booked_appointments(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.time_slots
            .iter()
            .filter(|s| s.is_booked)
            .filter_map(|s| s.appointment_id)
    }
}

/// One barber's configured calendar. Stored under the barber's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarberAvailability {
    pub admin_id: Uuid,
    pub current_month: CurrentMonth,
    pub schedule: Vec<ScheduleDay>,
    /// Bumped on every write; replaces are conditional on it.
    pub revision: i64,
    pub updated_at: DateTime<Utc>,
}

impl Document for BarberAvailability {
    const COLLECTION: &'static str = "availability";

    fn id(&self) -> Uuid {
        self.admin_id
    }
}

/// Result of a day edit: the regenerated day plus any appointments whose
/// reserved slots were dropped by it.
#[derive(Debug, Clone, Serialize)]
pub struct DayEdit {
    pub day: ScheduleDay,
    pub orphaned_appointments: Vec<Uuid>,
}

impl BarberAvailability {
    /// Record created implicitly by a first day edit; the month is known but
    /// not yet set up.
    pub fn starting_at(admin_id: Uuid, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            admin_id,
            current_month: CurrentMonth {
                month: date.month(),
                year: date.year(),
                is_set: false,
            },
            schedule: vec![],
            revision: 0,
            updated_at: now,
        }
    }

    pub fn day(&self, date: NaiveDate) -> Option<&ScheduleDay> {
        self.schedule.iter().find(|d| d.date == date)
    }

    /// Replaces the whole schedule with one working day (no hours yet) per
    /// listed day number. Returns appointments whose reservations were lost.
    pub fn setup_month(
        &mut self,
        month: u32,
        year: i32,
        working_days: &[u32],
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, ScheduleError> {
        let days = month_days(month, year, working_days)?;

        let orphaned: Vec<Uuid> = self
            .schedule
            .iter()
            .flat_map(ScheduleDay::booked_appointments)
            .collect();

        self.current_month = CurrentMonth {
            month,
            year,
            is_set: true,
        };
        self.schedule = days
            .into_iter()
            .map(|date| ScheduleDay {
                date,
                is_working_day: true,
                work_hours: None,
                time_slots: vec![],
            })
            .collect();
        self.touch(now);

        Ok(dedup(orphaned))
    }

    /// Sets or clears one day's hours and regenerates its slots from scratch.
    /// `None` for either bound marks the day non-working.
    pub fn set_day_hours(
        &mut self,
        date: NaiveDate,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
        calendar: &ShopCalendar,
        now: DateTime<Utc>,
    ) -> Result<DayEdit, ScheduleError> {
        let day = match (start, end) {
            (Some(start), Some(end)) => working_day(date, start, end, calendar)?,
            _ => ScheduleDay::non_working(date),
        };

        let orphaned = match self.schedule.iter_mut().find(|d| d.date == date) {
            Some(existing) => {
                let lost = dedup(existing.booked_appointments().collect());
                *existing = day.clone();
                lost
            }
            None => {
                self.schedule.push(day.clone());
                vec![]
            }
        };
        self.touch(now);

        Ok(DayEdit {
            day,
            orphaned_appointments: orphaned,
        })
    }

    /// Marks every slot overlapping `window` as booked by `appointment_id`.
    /// Slots already held by the same appointment are fine.
    pub fn reserve(&mut self, window: &TimeWindow, appointment_id: Uuid) -> Result<(), ScheduleError> {
        let overlapping = || {
            self.schedule
                .iter()
                .flat_map(|d| d.time_slots.iter())
                .filter(|s| s.window().overlaps(window))
        };
        if let Some(taken) = overlapping().find(|s| s.is_booked && s.appointment_id != Some(appointment_id)) {
            return Err(ScheduleError::SlotTaken(taken.start_time));
        }

        for slot in self
            .schedule
            .iter_mut()
            .flat_map(|d| d.time_slots.iter_mut())
            .filter(|s| s.window().overlaps(window))
        {
            slot.is_booked = true;
            slot.appointment_id = Some(appointment_id);
        }
        Ok(())
    }

    pub fn release(&mut self, appointment_id: Uuid) {
        for slot in self
            .schedule
            .iter_mut()
            .flat_map(|d| d.time_slots.iter_mut())
            .filter(|s| s.appointment_id == Some(appointment_id))
        {
            slot.is_booked = false;
            slot.appointment_id = None;
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }
}

/// Rounds a wall-clock time up to the next half-hour boundary and returns it
/// as minutes since midnight (may be 1440). Leftover seconds count as a
/// started minute.
pub fn round_up_to_slot(time: NaiveTime) -> u32 {
    let partial = u32::from(time.second() > 0 || time.nanosecond() > 0);
    let minutes = time.hour() * 60 + time.minute() + partial;
    match minutes % SLOT_MINUTES {
        0 => minutes,
        rem => minutes + (SLOT_MINUTES - rem),
    }
}

fn working_day(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    calendar: &ShopCalendar,
) -> Result<ScheduleDay, ScheduleError> {
    let start_min = round_up_to_slot(start);
    let end_min = round_up_to_slot(end);

    if end_min >= MINUTES_PER_DAY || start_min >= MINUTES_PER_DAY {
        return Err(ScheduleError::EndsPastMidnight);
    }
    if start_min >= end_min {
        return Err(ScheduleError::EmptyRange { start, end });
    }

    let time_slots = (start_min..end_min)
        .step_by(SLOT_MINUTES as usize)
        .map(|m| TimeSlot {
            start_time: calendar.at_minute(date, m),
            end_time: calendar.at_minute(date, m + SLOT_MINUTES),
            is_booked: false,
            appointment_id: None,
        })
        .collect();

    Ok(ScheduleDay {
        date,
        is_working_day: true,
        work_hours: Some(WorkHours {
            start: minute_to_time(start_min),
            end: minute_to_time(end_min),
        }),
        time_slots,
    })
}

fn minute_to_time(minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}

fn month_days(month: u32, year: i32, days: &[u32]) -> Result<Vec<NaiveDate>, ScheduleError> {
    if !(1..=12).contains(&month) {
        return Err(ScheduleError::InvalidMonth(month));
    }
    let mut dates = days
        .iter()
        .map(|&day| {
            NaiveDate::from_ymd_opt(year, month, day)
                .ok_or(ScheduleError::InvalidDay { year, month, day })
        })
        .collect::<Result<Vec<_>, _>>()?;
    dates.sort();
    dates.dedup();
    Ok(dates)
}

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids.dedup();
    ids
}
