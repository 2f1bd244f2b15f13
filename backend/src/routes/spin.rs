use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use rand::rngs::OsRng;
use serde::Deserialize;
use tracing::info;
use zilk_shared::constants::WHEEL_RADIUS;
use zilk_shared::prize_wheel::{promotional_prizes, PrizeWheel, SpinResponse, SpinStatusResponse, WheelView};

use crate::device::DeviceId;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::services::spin_service;
use crate::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(spin_promotional_wheel))
        .route("/prizes", get(get_promotional_wheel))
        .route("/status", get(get_spin_status))
        .route("/phone", post(claim_phone_bonus))
}

#[derive(Debug, Deserialize)]
pub struct PhoneBonusRequest {
    pub phone: String,
}

fn promotional_wheel() -> Result<PrizeWheel, AppError> {
    Ok(PrizeWheel::new(promotional_prizes())?)
}

async fn get_promotional_wheel() -> Result<Json<WheelView>, AppError> {
    Ok(Json(promotional_wheel()?.view(WHEEL_RADIUS)))
}

async fn get_spin_status(
    State(state): State<AppState>,
    device: DeviceId,
) -> Result<Json<SpinStatusResponse>, AppError> {
    let cooldown_seconds = spin_service::promo_cooldown_seconds(&state.redis, device.0).await?;
    let has_spin = cooldown_seconds == 0
        || spin_service::bonus_spin_available(&state.redis, device.0).await?;
    let spins_remaining = if has_spin { 1 } else { 0 };

    Ok(Json(SpinStatusResponse { spins_remaining, cooldown_seconds }))
}

async fn claim_phone_bonus(
    State(state): State<AppState>,
    device: DeviceId,
    ApiJson(request): ApiJson<PhoneBonusRequest>,
) -> Result<Json<SpinStatusResponse>, AppError> {
    spin_service::grant_phone_bonus(&state.redis, device.0, &request.phone).await?;
    let cooldown_seconds = spin_service::promo_cooldown_seconds(&state.redis, device.0).await?;

    Ok(Json(SpinStatusResponse { spins_remaining: 1, cooldown_seconds }))
}

async fn spin_promotional_wheel(
    State(state): State<AppState>,
    device: DeviceId,
) -> Result<Json<SpinResponse>, AppError> {
    let wheel = promotional_wheel()?;

    if !spin_service::claim_promo_spin(&state.redis, device.0).await? {
        let retry_after = spin_service::promo_cooldown_seconds(&state.redis, device.0).await?;
        return Err(AppError::NoSpinsRemaining { retry_after_secs: Some(retry_after) });
    }

    let outcome = wheel.spin(&mut OsRng);
    info!("🎡 PROMO SPIN: device {} won {}", device.0, outcome.prize.name);

    let message = match &outcome.prize.description {
        Some(description) => format!("You won: {}. {}", outcome.prize.name, description),
        None => format!("You won: {}", outcome.prize.name),
    };

    Ok(Json(SpinResponse {
        success: true,
        outcome: Some(outcome),
        spins_remaining: 0,
        message: Some(message),
    }))
}
