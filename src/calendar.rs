//! Shop-local calendar arithmetic.
//!
//! Every conversion between a UTC instant and a shop calendar day goes
//! through [`ShopCalendar`], so the schedule, the slot validator and the
//! booked-slot projection agree on where a day starts and ends.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

#[derive(Debug, Clone, Copy)]
pub struct ShopCalendar {
    offset: FixedOffset,
}

impl ShopCalendar {
    /// Returns `None` when the offset is outside +/-24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes * 60).map(|offset| Self { offset })
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Calendar day (shop wall clock) an instant falls on.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// UTC instant of a wall-clock time on a shop day.
    pub fn at(&self, day: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        self.midnight(day) + time.signed_duration_since(NaiveTime::MIN)
    }

    /// UTC instant `minutes` after the start of a shop day. Values past 1440
    /// land on the following day.
    pub fn at_minute(&self, day: NaiveDate, minutes: u32) -> DateTime<Utc> {
        self.midnight(day) + Duration::minutes(i64::from(minutes))
    }

    pub fn midnight(&self, day: NaiveDate) -> DateTime<Utc> {
        let local = day.and_time(NaiveTime::MIN);
        (local - Duration::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_utc_calendar_round_trip() {
        let cal = ShopCalendar::utc();
        let day = ymd(2024, 3, 15);
        let at = cal.at(day, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(at.to_rfc3339(), "2024-03-15T10:00:00+00:00");
        assert_eq!(cal.day_of(at), day);
    }

    #[test]
    fn test_offset_moves_day_boundary() {
        // UTC+2: 23:30 UTC on the 14th is already the 15th in the shop.
        let cal = ShopCalendar::from_offset_minutes(120).unwrap();
        let instant = DateTime::parse_from_rfc3339("2024-03-14T23:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(cal.day_of(instant), ymd(2024, 3, 15));
        assert_eq!(
            cal.midnight(ymd(2024, 3, 15)).to_rfc3339(),
            "2024-03-14T22:00:00+00:00"
        );
    }

    #[test]
    fn test_at_minute_past_midnight() {
        let cal = ShopCalendar::utc();
        let end = cal.at_minute(ymd(2024, 3, 15), 24 * 60);
        assert_eq!(cal.day_of(end), ymd(2024, 3, 16));
    }

    #[test]
    fn test_rejects_absurd_offset() {
        assert!(ShopCalendar::from_offset_minutes(25 * 60).is_none());
    }
}
