// src/routes/appointment_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState},
    scheduling::appointment::{Appointment, AppointmentStatus, Transition},
    services::appointments::{self, BookingRequest, RescheduleProposal},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(book_appointment))
        .route("/appointments/mine", get(list_my_appointments))
        .route("/appointments/admin", get(list_admin_appointments))
        .route("/appointments/{appointment_id}", get(get_appointment))
        .route("/appointments/{appointment_id}/reschedule", post(request_reschedule))
        .route("/appointments/{appointment_id}/reschedule/respond", post(respond_reschedule))
        .route("/appointments/{appointment_id}/confirm", post(confirm))
        .route("/appointments/{appointment_id}/complete", post(complete))
        .route("/appointments/{appointment_id}/cancel", post(cancel))
        .route("/appointments/{appointment_id}/reject", post(reject))
        .route("/appointments/{appointment_id}/status", patch(set_status))
}

/* ============================================================
   Request DTOs
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub accept: bool,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoteRequest {
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: AppointmentStatus,
    pub note: Option<String>,
}

/* ============================================================
   Handlers
   ============================================================ */

type AppointmentResponse = Result<Json<ApiOk<Appointment>>, ApiError>;

/// POST /api/v1/appointments
pub async fn book_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<BookingRequest>,
) -> AppointmentResponse {
    let actor = auth.actor()?;
    let data = appointments::book(state.store.as_ref(), &state.calendar, &actor, req).await?;
    Ok(Json(ApiOk { data }))
}

/// GET /api/v1/appointments/mine
pub async fn list_my_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiOk<Vec<Appointment>>>, ApiError> {
    let actor = auth.actor()?;
    let data = appointments::list_for_user(state.store.as_ref(), &actor).await?;
    Ok(Json(ApiOk { data }))
}

/// GET /api/v1/appointments/admin?status=
pub async fn list_admin_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<AdminListQuery>,
) -> Result<Json<ApiOk<Vec<Appointment>>>, ApiError> {
    let actor = auth.actor()?;
    let data = appointments::list_for_admin(state.store.as_ref(), &actor, q.status).await?;
    Ok(Json(ApiOk { data }))
}

/// GET /api/v1/appointments/{appointment_id}
pub async fn get_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> AppointmentResponse {
    let actor = auth.actor()?;
    let data = appointments::get(state.store.as_ref(), &actor, appointment_id).await?;
    Ok(Json(ApiOk { data }))
}

/// POST /api/v1/appointments/{appointment_id}/reschedule
pub async fn request_reschedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<RescheduleProposal>,
) -> AppointmentResponse {
    let actor = auth.actor()?;
    let data = appointments::request_reschedule(
        state.store.as_ref(),
        &state.calendar,
        &actor,
        appointment_id,
        req,
    )
    .await?;
    Ok(Json(ApiOk { data }))
}

/// POST /api/v1/appointments/{appointment_id}/reschedule/respond
pub async fn respond_reschedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> AppointmentResponse {
    let actor = auth.actor()?;
    let data = appointments::respond_to_reschedule(
        state.store.as_ref(),
        &state.calendar,
        &actor,
        appointment_id,
        req.accept,
        req.note,
    )
    .await?;
    Ok(Json(ApiOk { data }))
}

async fn run_transition(
    state: &AppState,
    auth: &AuthContext,
    appointment_id: Uuid,
    transition: Transition,
) -> AppointmentResponse {
    let actor = auth.actor()?;
    let data = appointments::transition(
        state.store.as_ref(),
        &state.calendar,
        &actor,
        appointment_id,
        transition,
    )
    .await?;
    Ok(Json(ApiOk { data }))
}

/// POST /api/v1/appointments/{appointment_id}/confirm
pub async fn confirm(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> AppointmentResponse {
    run_transition(&state, &auth, appointment_id, Transition::Confirm).await
}

/// POST /api/v1/appointments/{appointment_id}/complete
pub async fn complete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> AppointmentResponse {
    run_transition(&state, &auth, appointment_id, Transition::Complete).await
}

/// POST /api/v1/appointments/{appointment_id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> AppointmentResponse {
    run_transition(&state, &auth, appointment_id, Transition::Cancel).await
}

/// POST /api/v1/appointments/{appointment_id}/reject
pub async fn reject(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    body: Option<Json<NoteRequest>>,
) -> AppointmentResponse {
    let note = body.and_then(|Json(b)| b.note);
    run_transition(&state, &auth, appointment_id, Transition::Reject { note }).await
}

/// PATCH /api/v1/appointments/{appointment_id}/status
/// Barber override, no transition checks.
pub async fn set_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> AppointmentResponse {
    run_transition(
        &state,
        &auth,
        appointment_id,
        Transition::SetStatus {
            status: req.status,
            note: req.note,
        },
    )
    .await
}
