// src/services/availability.rs

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::calendar::ShopCalendar;
use crate::models::Actor;
use crate::scheduling::appointment::{Appointment, AppointmentStatus};
use crate::scheduling::projection::{self, BookedSlot, PublicDay};
use crate::scheduling::schedule::{BarberAvailability, CurrentMonth, DayEdit};
use crate::store::{self, DocumentStore, Filter, StoreError, Write};

use super::ServiceError;

#[derive(Debug, Serialize)]
pub struct MonthSetup {
    pub availability: BarberAvailability,
    pub orphaned_appointments: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PublicAvailability {
    pub admin_id: Uuid,
    pub current_month: CurrentMonth,
    pub days: Vec<PublicDay>,
}

fn ensure_barber(actor: &Actor) -> Result<(), ServiceError> {
    if actor.is_barber() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Only barbers can manage availability".into(),
        ))
    }
}

pub async fn find_availability(
    store: &dyn DocumentStore,
    admin_id: Uuid,
) -> Result<Option<BarberAvailability>, ServiceError> {
    Ok(store::load::<BarberAvailability>(store, admin_id).await?)
}

pub async fn load_availability(
    store: &dyn DocumentStore,
    admin_id: Uuid,
) -> Result<BarberAvailability, ServiceError> {
    find_availability(store, admin_id)
        .await?
        .ok_or(ServiceError::NotFound("availability"))
}

/// Write for a record that was loaded at `loaded_revision` (or did not exist).
pub fn availability_write(
    availability: &BarberAvailability,
    loaded_revision: Option<i64>,
) -> Result<Write, StoreError> {
    match loaded_revision {
        Some(rev) => Write::replace_if_revision(availability, rev),
        None => Write::insert(availability),
    }
}

/// Active appointments of one barber, in any order.
pub async fn active_appointments(
    store: &dyn DocumentStore,
    admin_id: Uuid,
) -> Result<Vec<Appointment>, ServiceError> {
    let active = AppointmentStatus::ACTIVE.iter().map(|s| json!(s)).collect();
    let filter = Filter::new()
        .eq("admin_id", json!(admin_id))
        .one_of("status", active);
    Ok(store::find::<Appointment>(store, &filter, None).await?)
}

pub async fn get_own_availability(
    store: &dyn DocumentStore,
    actor: &Actor,
) -> Result<BarberAvailability, ServiceError> {
    ensure_barber(actor)?;
    load_availability(store, actor.id).await
}

pub async fn setup_month(
    store: &dyn DocumentStore,
    actor: &Actor,
    month: u32,
    year: i32,
    working_days: &[u32],
) -> Result<MonthSetup, ServiceError> {
    ensure_barber(actor)?;
    let now = Utc::now();

    let existing = find_availability(store, actor.id).await?;
    let loaded_revision = existing.as_ref().map(|a| a.revision);
    let mut availability = existing.unwrap_or_else(|| {
        BarberAvailability::starting_at(actor.id, NaiveDate::MIN, now)
    });

    let orphaned = availability.setup_month(month, year, working_days, now)?;
    store
        .transact(vec![availability_write(&availability, loaded_revision)?])
        .await?;

    if !orphaned.is_empty() {
        tracing::warn!(
            admin_id = %actor.id,
            orphaned = ?orphaned,
            "month setup dropped booked slots"
        );
    }
    tracing::info!(admin_id = %actor.id, month, year, days = availability.schedule.len(), "month set up");

    Ok(MonthSetup {
        availability,
        orphaned_appointments: orphaned,
    })
}

pub async fn set_day_hours(
    store: &dyn DocumentStore,
    calendar: &ShopCalendar,
    actor: &Actor,
    date: NaiveDate,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<DayEdit, ServiceError> {
    ensure_barber(actor)?;
    let now = Utc::now();

    let existing = find_availability(store, actor.id).await?;
    let loaded_revision = existing.as_ref().map(|a| a.revision);
    let mut availability =
        existing.unwrap_or_else(|| BarberAvailability::starting_at(actor.id, date, now));

    let edit = availability.set_day_hours(date, start, end, calendar, now)?;
    store
        .transact(vec![availability_write(&availability, loaded_revision)?])
        .await?;

    if !edit.orphaned_appointments.is_empty() {
        tracing::warn!(
            admin_id = %actor.id,
            %date,
            orphaned = ?edit.orphaned_appointments,
            "day edit dropped booked slots"
        );
    }
    tracing::info!(
        admin_id = %actor.id,
        %date,
        working = edit.day.is_working_day,
        slots = edit.day.time_slots.len(),
        "day hours updated"
    );

    Ok(edit)
}

pub async fn booked_slots(
    store: &dyn DocumentStore,
    admin_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<BookedSlot>, ServiceError> {
    let active = active_appointments(store, admin_id).await?;
    Ok(projection::booked_slots(&active)
        .into_iter()
        .filter(|s| from.is_none_or(|f| s.date >= f))
        .filter(|s| to.is_none_or(|t| s.date <= t))
        .collect())
}

pub async fn public_availability(
    store: &dyn DocumentStore,
    admin_id: Uuid,
) -> Result<PublicAvailability, ServiceError> {
    let availability = load_availability(store, admin_id).await?;
    let booked = booked_slots(store, admin_id, None, None).await?;

    Ok(PublicAvailability {
        admin_id,
        current_month: availability.current_month,
        days: projection::public_schedule(&availability, &booked),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{Shop, hm, ymd};

    #[tokio::test]
    async fn test_lookup_without_record_is_not_found() {
        let shop = Shop::new().await;
        assert!(matches!(
            get_own_availability(&shop.store, &shop.barber).await,
            Err(ServiceError::NotFound("availability"))
        ));
        assert!(matches!(
            public_availability(&shop.store, shop.barber.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_customers_cannot_edit_schedule() {
        let shop = Shop::new().await;
        let customer = Actor::customer(Uuid::new_v4());
        assert!(matches!(
            setup_month(&shop.store, &customer, 3, 2024, &[1]).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_day_edit_creates_record() {
        let shop = Shop::new().await;
        let edit = set_day_hours(
            &shop.store,
            &shop.calendar,
            &shop.barber,
            ymd(2024, 4, 2),
            Some(hm(10, 0)),
            Some(hm(11, 0)),
        )
        .await
        .unwrap();
        assert_eq!(edit.day.time_slots.len(), 2);

        let stored = get_own_availability(&shop.store, &shop.barber).await.unwrap();
        assert_eq!(stored.current_month.month, 4);
        assert_eq!(stored.current_month.year, 2024);
        assert!(!stored.current_month.is_set);
        assert_eq!(stored.schedule.len(), 1);
    }

    #[tokio::test]
    async fn test_month_then_hours() {
        let shop = Shop::new().await.with_march().await;
        let stored = get_own_availability(&shop.store, &shop.barber).await.unwrap();
        assert!(stored.current_month.is_set);
        assert_eq!(stored.schedule.len(), 3);
        let first = stored.day(ymd(2024, 3, 1)).unwrap();
        assert_eq!(first.time_slots.len(), 6);

        let public = public_availability(&shop.store, shop.barber.id).await.unwrap();
        assert_eq!(public.days.len(), 3);
        assert_eq!(public.days[0].open_slots.len(), 6);
        assert!(public.days[1].open_slots.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_month_is_validation_error() {
        let shop = Shop::new().await;
        assert!(matches!(
            setup_month(&shop.store, &shop.barber, 2, 2023, &[30]).await,
            Err(ServiceError::Validation { .. })
        ));
    }
}
