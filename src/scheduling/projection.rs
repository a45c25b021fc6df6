// src/scheduling/projection.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::TimeWindow;
use super::appointment::{Appointment, AppointmentStatus};
use super::schedule::{BarberAvailability, WorkHours};

/// An occupied window with nothing that identifies the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookedSlot {
    pub admin_id: Uuid,
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BookedSlot {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
        }
    }
}

/// Window an appointment should block on the public calendar. While a
/// reschedule is open the proposed window is shown instead of the original.
pub fn occupied_slot(appt: &Appointment) -> Option<BookedSlot> {
    if !appt.status.is_active() {
        return None;
    }

    let (date, window) = match (&appt.reschedule_request, appt.status) {
        (Some(req), AppointmentStatus::ReschedulePending) if req.is_open() => {
            (req.proposed_date, req.proposed_time_slot)
        }
        _ => (appt.appointment_date, appt.time_slot),
    };

    Some(BookedSlot {
        admin_id: appt.admin_id,
        date,
        start: window.start,
        end: window.end,
    })
}

/// Booked slots sorted by start time.
pub fn booked_slots<'a>(appointments: impl IntoIterator<Item = &'a Appointment>) -> Vec<BookedSlot> {
    let mut out: Vec<BookedSlot> = appointments.into_iter().filter_map(occupied_slot).collect();
    out.sort_by_key(|s| s.start);
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicDay {
    pub date: NaiveDate,
    pub work_hours: Option<WorkHours>,
    pub open_slots: Vec<OpenSlot>,
}

/// Working days with only the slots a customer could still book.
pub fn public_schedule(availability: &BarberAvailability, booked: &[BookedSlot]) -> Vec<PublicDay> {
    let mut days: Vec<PublicDay> = availability
        .schedule
        .iter()
        .filter(|d| d.is_working_day)
        .map(|d| PublicDay {
            date: d.date,
            work_hours: d.work_hours,
            open_slots: d
                .time_slots
                .iter()
                .filter(|s| !s.is_booked)
                .filter(|s| !booked.iter().any(|b| b.window().overlaps(&s.window())))
                .map(|s| OpenSlot {
                    start_time: s.start_time,
                    end_time: s.end_time,
                })
                .collect(),
        })
        .collect();
    days.sort_by_key(|d| d.date);
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ShopCalendar;
    use crate::scheduling::appointment::tests::{appointment, window};
    use crate::scheduling::appointment::{Party, Transition};
    use chrono::NaiveTime;

    #[test]
    fn test_only_active_appointments_projected() {
        let mut list = vec![];
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::RescheduleConfirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
            AppointmentStatus::Rejected,
            AppointmentStatus::RescheduleRejected,
        ] {
            list.push(appointment(status));
        }
        assert_eq!(booked_slots(&list).len(), 3);
    }

    #[test]
    fn test_open_reschedule_reports_proposed_slot() {
        let mut appt = appointment(AppointmentStatus::Confirmed);
        appt.apply(
            Transition::RequestReschedule {
                by: Party::User,
                proposed_date: NaiveDate::from_ymd_opt(2024, 3, 16).unwrap(),
                proposed_time_slot: window(16, 11, 0),
            },
            Utc::now(),
        )
        .unwrap();

        let slot = occupied_slot(&appt).unwrap();
        assert_eq!(slot.start, window(16, 11, 0).start);
        assert_eq!(slot.date, NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
        assert_eq!(slot.admin_id, appt.admin_id);
    }

    #[test]
    fn test_projection_is_sorted() {
        let mut late = appointment(AppointmentStatus::Pending);
        late.time_slot = window(15, 14, 0);
        let early = appointment(AppointmentStatus::Pending);
        let slots = booked_slots([&late, &early]);
        assert_eq!(slots[0].start, early.time_slot.start);
        assert_eq!(slots[1].start, late.time_slot.start);
    }

    #[test]
    fn test_public_schedule_hides_taken_slots() {
        let cal = ShopCalendar::utc();
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        let mut av = BarberAvailability::starting_at(Uuid::new_v4(), day, Utc::now());
        av.set_day_hours(day, Some(hm(9, 0)), Some(hm(11, 0)), &cal, Utc::now()).unwrap();
        av.set_day_hours(day.succ_opt().unwrap(), None, None, &cal, Utc::now()).unwrap();

        // 09:00 reserved in the schedule itself, 10:00 only via a pending proposal
        av.reserve(&window(15, 9, 0), Uuid::new_v4()).unwrap();
        let proposal = BookedSlot {
            admin_id: av.admin_id,
            date: day,
            start: window(15, 10, 0).start,
            end: window(15, 10, 0).end,
        };

        let days = public_schedule(&av, &[proposal]);
        assert_eq!(days.len(), 1);
        let starts: Vec<DateTime<Utc>> = days[0].open_slots.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![window(15, 9, 30).start, window(15, 10, 30).start]);
    }
}
