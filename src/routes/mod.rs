use crate::models::AppState;
use axum::Router;

pub mod appointment_routes;
pub mod auth_routes;
pub mod availability_routes;
pub mod review_routes;
pub mod service_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/auth", auth_routes::router())
        .nest("/api/v1/services", service_routes::router())
        .nest("/api/v1", availability_routes::router())
        .nest("/api/v1", appointment_routes::router())
        .nest("/api/v1", review_routes::router())
        .with_state(state)
}
