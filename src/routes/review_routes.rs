// src/routes/review_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, OkData},
    scheduling::review::Review,
    services::reviews::{self, NewReview, ReviewPatch},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_reviews).post(create_review))
        .route("/reviews/{review_id}", patch(update_review).delete(delete_review))
}

#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    pub admin_id: Option<Uuid>,
}

/// GET /api/v1/reviews?admin_id=
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(q): Query<ReviewListQuery>,
) -> Result<Json<ApiOk<Vec<Review>>>, ApiError> {
    let data = reviews::list_reviews(state.store.as_ref(), q.admin_id).await?;
    Ok(Json(ApiOk { data }))
}

/// POST /api/v1/reviews
pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<NewReview>,
) -> Result<Json<ApiOk<Review>>, ApiError> {
    let actor = auth.actor()?;
    let data = reviews::create_review(state.store.as_ref(), &actor, req).await?;
    Ok(Json(ApiOk { data }))
}

/// PATCH /api/v1/reviews/{review_id}
pub async fn update_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(review_id): Path<Uuid>,
    Json(req): Json<ReviewPatch>,
) -> Result<Json<ApiOk<Review>>, ApiError> {
    let actor = auth.actor()?;
    let data = reviews::update_review(state.store.as_ref(), &actor, review_id, req).await?;
    Ok(Json(ApiOk { data }))
}

/// DELETE /api/v1/reviews/{review_id}
pub async fn delete_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(review_id): Path<Uuid>,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    let actor = auth.actor()?;
    reviews::delete_review(state.store.as_ref(), &actor, review_id).await?;
    Ok(Json(ApiOk {
        data: OkData { ok: true },
    }))
}
