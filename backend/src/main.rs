use axum::http::header::HeaderName;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use redis::Client as RedisClient;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use zilk_shared::constants::{DEALS_ENDPOINT, DEVICE_ID_HEADER, HEALTH_CHECK_ENDPOINT, SPIN_ENDPOINT};

use crate::config::Config;

mod config;
mod device;
mod error;
mod extract;
mod logging;
mod models;
mod routes;
mod services;

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    redis: RedisClient,
}

pub async fn health_check() -> &'static str {
    "OK"
}

fn create_app(state: AppState, cors_origins: &[HeaderValue]) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origins.to_vec())
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![
            HeaderName::from_static("content-type"),
            HeaderName::from_static(DEVICE_ID_HEADER),
        ]);

    Router::new()
        .route(HEALTH_CHECK_ENDPOINT, get(health_check))
        .nest(DEALS_ENDPOINT, routes::deals::create_router())
        .nest(SPIN_ENDPOINT, routes::spin::create_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_path(".env").ok();
    logging::setup()?;

    let config = Config::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    let redis = RedisClient::open(config.redis_url.as_str())?;

    let app = create_app(AppState { pool, redis }, &config.cors_origins);

    info!("listening on {}", config.bind_addr);
    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
