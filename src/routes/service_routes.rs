// src/routes/service_routes.rs

use axum::{Json, Router, extract::State, routing::get};

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, ServiceOffering},
    services::catalog::{self, NewService},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_services).post(create_service))
}

/// GET /api/v1/services
pub async fn list_services(
    State(state): State<AppState>,
) -> Result<Json<ApiOk<Vec<ServiceOffering>>>, ApiError> {
    let data = catalog::list_services(state.store.as_ref()).await?;
    Ok(Json(ApiOk { data }))
}

/// POST /api/v1/services
pub async fn create_service(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<NewService>,
) -> Result<Json<ApiOk<ServiceOffering>>, ApiError> {
    let actor = auth.actor()?;
    let data = catalog::create_service(state.store.as_ref(), &actor, req).await?;
    Ok(Json(ApiOk { data }))
}
