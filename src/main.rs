mod auth;
mod calendar;
mod config;
mod middleware;

mod db;
mod error;
mod models;
mod routes;
mod scheduling;
mod services;
mod store;

use std::sync::Arc;

use crate::{
    calendar::ShopCalendar,
    config::Config,
    models::AppState,
    store::PgDocumentStore,
};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = Config::from_env()?;
    let calendar = ShopCalendar::from_offset_minutes(cfg.shop_utc_offset_minutes)
        .ok_or_else(|| anyhow::anyhow!("invalid shop UTC offset: {}", cfg.shop_utc_offset_minutes))?;
    let pool = db::connect_pg(&cfg.database_url).await?;

    let state = AppState {
        db: pool.clone(),
        store: Arc::new(PgDocumentStore::new(pool)),
        calendar,
        session_ttl_hours: cfg.session_ttl_hours,
    };

    // Browser clients call the API cross-origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!(
        utc_offset_minutes = cfg.shop_utc_offset_minutes,
        "Listening on http://{}",
        cfg.bind_addr
    );
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
