// src/services/appointments.rs

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::calendar::ShopCalendar;
use crate::models::{Actor, ServiceOffering};
use crate::scheduling::TimeWindow;
use crate::scheduling::appointment::{
    Appointment, AppointmentStatus, ContactInfo, Party, Transition,
};
use crate::scheduling::projection;
use crate::scheduling::validator::validate_slot;
use crate::store::{self, DocumentStore, Filter, Write};

use super::ServiceError;
use super::availability::{
    active_appointments, availability_write, find_availability, load_availability,
};

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub admin_id: Uuid,
    pub service_id: Uuid,
    /// Defaults to the shop day of `time_slot.start`.
    pub appointment_date: Option<NaiveDate>,
    pub time_slot: TimeWindow,
    pub contact_info: ContactInfo,
}

/* -------------------------
   Helpers
--------------------------*/

async fn load_appointment(store: &dyn DocumentStore, id: Uuid) -> Result<Appointment, ServiceError> {
    store::load::<Appointment>(store, id)
        .await?
        .ok_or(ServiceError::NotFound("appointment"))
}

/// Which side of the appointment the actor is on.
fn party_of(actor: &Actor, appt: &Appointment) -> Result<Party, ServiceError> {
    if actor.is_barber() && appt.admin_id == actor.id {
        Ok(Party::Admin)
    } else if appt.user_id == actor.id {
        Ok(Party::User)
    } else {
        Err(ServiceError::Forbidden(
            "You do not have access to this appointment".into(),
        ))
    }
}

fn check_contact(contact: &ContactInfo) -> Result<(), ServiceError> {
    let email = contact.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::validation("contact email is invalid"));
    }
    if contact.phone.as_deref().is_some_and(|p| p.trim().is_empty()) {
        return Err(ServiceError::validation("contact phone must not be blank"));
    }
    Ok(())
}

/// Fails when `window` overlaps what another active appointment occupies.
fn ensure_free(
    others: &[Appointment],
    window: &TimeWindow,
    exclude: Option<Uuid>,
) -> Result<(), ServiceError> {
    let taken = projection::booked_slots(others.iter().filter(|a| Some(a.id) != exclude))
        .into_iter()
        .find(|slot| slot.window().overlaps(window));

    match taken {
        Some(slot) => Err(ServiceError::Conflict(format!(
            "time slot starting {} is already booked",
            slot.start
        ))),
        None => Ok(()),
    }
}

fn authorize(party: Party, appt: &Appointment, transition: &Transition) -> Result<(), ServiceError> {
    match transition {
        Transition::RequestReschedule { .. } => Ok(()),
        Transition::ConfirmReschedule | Transition::RejectReschedule { .. } => {
            match appt.reschedule_request.as_ref() {
                Some(req) if req.is_open() && req.requested_by == party => Err(ServiceError::Forbidden(
                    "A reschedule request must be answered by the other party".into(),
                )),
                _ => Ok(()),
            }
        }
        Transition::Cancel => match party {
            Party::User => Ok(()),
            Party::Admin => Err(ServiceError::Forbidden(
                "Only the customer can cancel an appointment".into(),
            )),
        },
        Transition::Confirm
        | Transition::Complete
        | Transition::Reject { .. }
        | Transition::SetStatus { .. } => match party {
            Party::Admin => Ok(()),
            Party::User => Err(ServiceError::Forbidden(format!(
                "Only the barber can {} an appointment",
                transition.name().replace('_', " ")
            ))),
        },
    }
}

/* -------------------------
   Operations
--------------------------*/

pub async fn book(
    store: &dyn DocumentStore,
    calendar: &ShopCalendar,
    actor: &Actor,
    req: BookingRequest,
) -> Result<Appointment, ServiceError> {
    check_contact(&req.contact_info)?;

    let service = store::load::<ServiceOffering>(store, req.service_id)
        .await?
        .filter(|s| s.is_active)
        .ok_or(ServiceError::NotFound("service"))?;

    let date = req
        .appointment_date
        .unwrap_or_else(|| calendar.day_of(req.time_slot.start));

    let mut availability = load_availability(store, req.admin_id).await?;
    validate_slot(&availability, date, &req.time_slot, calendar)?;

    let others = active_appointments(store, req.admin_id).await?;
    ensure_free(&others, &req.time_slot, None)?;

    let now = Utc::now();
    let appt = Appointment {
        id: Uuid::new_v4(),
        user_id: actor.id,
        admin_id: req.admin_id,
        service_id: service.id,
        appointment_date: date,
        time_slot: req.time_slot,
        status: AppointmentStatus::Pending,
        contact_info: req.contact_info,
        reschedule_request: None,
        rejection_details: None,
        review: None,
        has_review: false,
        revision: 0,
        created_at: now,
        updated_at: now,
    };

    let loaded_revision = availability.revision;
    availability.reserve(&appt.time_slot, appt.id)?;
    availability.touch(now);

    store
        .transact(vec![
            Write::insert(&appt)?,
            Write::replace_if_revision(&availability, loaded_revision)?,
        ])
        .await?;

    tracing::info!(
        appointment_id = %appt.id,
        admin_id = %appt.admin_id,
        %date,
        start = %appt.time_slot.start,
        "appointment booked"
    );
    Ok(appt)
}

pub async fn get(store: &dyn DocumentStore, actor: &Actor, id: Uuid) -> Result<Appointment, ServiceError> {
    let appt = load_appointment(store, id).await?;
    party_of(actor, &appt)?;
    Ok(appt)
}

pub async fn list_for_user(store: &dyn DocumentStore, actor: &Actor) -> Result<Vec<Appointment>, ServiceError> {
    let filter = Filter::new().eq("user_id", json!(actor.id));
    let mut out = store::find::<Appointment>(store, &filter, None).await?;
    out.sort_by_key(|a| a.time_slot.start);
    Ok(out)
}

pub async fn list_for_admin(
    store: &dyn DocumentStore,
    actor: &Actor,
    status: Option<AppointmentStatus>,
) -> Result<Vec<Appointment>, ServiceError> {
    if !actor.is_barber() {
        return Err(ServiceError::Forbidden(
            "Only barbers can list their bookings".into(),
        ));
    }

    let mut filter = Filter::new().eq("admin_id", json!(actor.id));
    if let Some(status) = status {
        filter = filter.eq("status", json!(status));
    }
    let mut out = store::find::<Appointment>(store, &filter, None).await?;
    out.sort_by_key(|a| a.time_slot.start);
    Ok(out)
}

/// Parameters of a reschedule proposal; the requesting side comes from the actor.
#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleProposal {
    pub proposed_date: Option<NaiveDate>,
    pub proposed_time_slot: TimeWindow,
}

pub async fn request_reschedule(
    store: &dyn DocumentStore,
    calendar: &ShopCalendar,
    actor: &Actor,
    id: Uuid,
    proposal: RescheduleProposal,
) -> Result<Appointment, ServiceError> {
    let appt = load_appointment(store, id).await?;
    let by = party_of(actor, &appt)?;
    let proposed_date = proposal
        .proposed_date
        .unwrap_or_else(|| calendar.day_of(proposal.proposed_time_slot.start));

    transition(
        store,
        calendar,
        actor,
        id,
        Transition::RequestReschedule {
            by,
            proposed_date,
            proposed_time_slot: proposal.proposed_time_slot,
        },
    )
    .await
}

pub async fn respond_to_reschedule(
    store: &dyn DocumentStore,
    calendar: &ShopCalendar,
    actor: &Actor,
    id: Uuid,
    accept: bool,
    note: Option<String>,
) -> Result<Appointment, ServiceError> {
    let t = if accept {
        Transition::ConfirmReschedule
    } else {
        Transition::RejectReschedule { note }
    };
    transition(store, calendar, actor, id, t).await
}

/// Applies one lifecycle transition and keeps the barber's slot reservations
/// in step with it.
pub async fn transition(
    store: &dyn DocumentStore,
    calendar: &ShopCalendar,
    actor: &Actor,
    id: Uuid,
    transition: Transition,
) -> Result<Appointment, ServiceError> {
    let mut appt = load_appointment(store, id).await?;
    let party = party_of(actor, &appt)?;
    authorize(party, &appt, &transition)?;

    // the barber may have edited hours between request and confirmation
    let target = match &transition {
        Transition::RequestReschedule {
            proposed_date,
            proposed_time_slot,
            ..
        } => Some((*proposed_date, *proposed_time_slot)),
        Transition::ConfirmReschedule => appt
            .reschedule_request
            .as_ref()
            .filter(|r| r.is_open())
            .map(|r| (r.proposed_date, r.proposed_time_slot)),
        _ => None,
    };
    if let Some((date, window)) = &target {
        let availability = load_availability(store, appt.admin_id).await?;
        validate_slot(&availability, *date, window, calendar)?;
        let others = active_appointments(store, appt.admin_id).await?;
        ensure_free(&others, window, Some(appt.id))?;
    }

    let action = transition.name();
    let from = appt.status;
    let before = appt.reserved_window();
    let appt_revision = appt.revision;
    let now = Utc::now();
    appt.apply(transition, now)?;
    let after = appt.reserved_window();

    let mut writes = vec![Write::replace_if_revision(&appt, appt_revision)?];
    if before != after {
        if let Some(window) = &after {
            let others = active_appointments(store, appt.admin_id).await?;
            ensure_free(&others, window, Some(appt.id))?;
        }

        if let Some(mut availability) = find_availability(store, appt.admin_id).await? {
            let loaded_revision = availability.revision;
            availability.release(appt.id);
            if let Some(window) = &after {
                availability.reserve(window, appt.id)?;
            }
            availability.touch(now);
            writes.push(availability_write(&availability, Some(loaded_revision))?);
        }
    }

    store.transact(writes).await?;

    tracing::info!(
        appointment_id = %appt.id,
        admin_id = %appt.admin_id,
        action,
        from = %from,
        to = %appt.status,
        terminal = appt.status.is_terminal(),
        "appointment transition"
    );
    Ok(appt)
}
