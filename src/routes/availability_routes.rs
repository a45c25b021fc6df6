// src/routes/availability_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState},
    scheduling::projection::BookedSlot,
    scheduling::schedule::{BarberAvailability, DayEdit},
    services::availability::{self, MonthSetup, PublicAvailability},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/availability", get(get_own_availability))
        .route("/availability/month", post(setup_month))
        .route("/availability/days/{date}", put(set_day_hours))
        .route("/availability/{admin_id}", get(get_public_availability))
        .route("/availability/{admin_id}/booked-slots", get(get_booked_slots))
}

/* ============================================================
   Request DTOs
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct SetupMonthRequest {
    pub month: u32,
    pub year: i32,
    pub working_days: Vec<u32>,
}

/// Either bound missing or null marks the day as non-working.
#[derive(Debug, Deserialize)]
pub struct DayHoursRequest {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
pub struct BookedSlotsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/* ============================================================
   Handlers
   ============================================================ */

/// GET /api/v1/availability
pub async fn get_own_availability(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiOk<BarberAvailability>>, ApiError> {
    let actor = auth.actor()?;
    let data = availability::get_own_availability(state.store.as_ref(), &actor).await?;
    Ok(Json(ApiOk { data }))
}

/// POST /api/v1/availability/month
pub async fn setup_month(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<SetupMonthRequest>,
) -> Result<Json<ApiOk<MonthSetup>>, ApiError> {
    let actor = auth.actor()?;
    let data = availability::setup_month(
        state.store.as_ref(),
        &actor,
        req.month,
        req.year,
        &req.working_days,
    )
    .await?;
    Ok(Json(ApiOk { data }))
}

/// PUT /api/v1/availability/days/{date}
pub async fn set_day_hours(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(date): Path<NaiveDate>,
    Json(req): Json<DayHoursRequest>,
) -> Result<Json<ApiOk<DayEdit>>, ApiError> {
    let actor = auth.actor()?;
    let data = availability::set_day_hours(
        state.store.as_ref(),
        &state.calendar,
        &actor,
        date,
        req.start_time,
        req.end_time,
    )
    .await?;
    Ok(Json(ApiOk { data }))
}

/// GET /api/v1/availability/{admin_id}
/// Public: working days with their free slots only.
pub async fn get_public_availability(
    State(state): State<AppState>,
    Path(admin_id): Path<Uuid>,
) -> Result<Json<ApiOk<PublicAvailability>>, ApiError> {
    let data = availability::public_availability(state.store.as_ref(), admin_id).await?;
    Ok(Json(ApiOk { data }))
}

/// GET /api/v1/availability/{admin_id}/booked-slots?from=&to=
pub async fn get_booked_slots(
    State(state): State<AppState>,
    Path(admin_id): Path<Uuid>,
    Query(q): Query<BookedSlotsQuery>,
) -> Result<Json<ApiOk<Vec<BookedSlot>>>, ApiError> {
    if let (Some(from), Some(to)) = (q.from, q.to) {
        if from > to {
            return Err(ApiError::BadRequest(
                "VALIDATION_ERROR",
                "from must not be after to".into(),
            ));
        }
    }
    let data = availability::booked_slots(state.store.as_ref(), admin_id, q.from, q.to).await?;
    Ok(Json(ApiOk { data }))
}
