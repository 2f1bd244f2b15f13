use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rand::rngs::OsRng;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use zilk_shared::constants::{SEARCH_TOO_LONG_ERROR, WHEEL_RADIUS};
use zilk_shared::deal_ranking::{
    listable_deals, rank_deals, Deal, DealFilters, DiscountTypeFilter, RankedDeal, SortKey,
};
use zilk_shared::geo::Coordinate;
use zilk_shared::pagination::{paginate, Page, PageRequest};
use zilk_shared::prize_wheel::{deal_prizes, PrizeWheel, SpinResponse, SpinStatusResponse, WheelView};
use zilk_shared::validation::validate_search_query;

use crate::device::DeviceId;
use crate::error::AppError;
use crate::extract::{ApiPath, ApiQuery};
use crate::models::DealListing;
use crate::services::{deal_service, spin_service};
use crate::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_deals))
        .route("/:id", get(get_deal))
        .route("/:id/wheel", get(get_deal_wheel))
        .route("/:id/spin", post(spin_deal_wheel))
        .route("/:id/spins", get(get_deal_spin_status))
}

#[derive(Debug, Default, Deserialize)]
pub struct DealQuery {
    pub search: Option<String>,
    pub discount_type: Option<DiscountTypeFilter>,
    pub sort_by: Option<SortKey>,
    pub max_distance: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// Both halves are needed; one alone is ignored.
fn viewer_from(lat: Option<f64>, lon: Option<f64>) -> Option<Coordinate> {
    match (lat, lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Coordinate::new(lat, lon)),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl DealQuery {
    pub fn viewer(&self) -> Option<Coordinate> {
        viewer_from(self.lat, self.lon)
    }

    pub fn filters(&self) -> DealFilters {
        DealFilters {
            search: self.search.clone().unwrap_or_default(),
            discount_type: self.discount_type.unwrap_or_default(),
            sort_by: self.sort_by.unwrap_or_default(),
            max_distance_miles: self.max_distance.filter(|d| d.is_finite() && *d > 0.0),
        }
    }
}

async fn list_deals(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DealQuery>,
) -> Result<Json<Page<DealListing>>, AppError> {
    let filters = query.filters();
    validate_search_query(&filters.search).map_err(|_| AppError::BadRequest(SEARCH_TOO_LONG_ERROR.to_string()))?;

    let deals = deal_service::fetch_active_deals(&state.pool).await?;
    let deals = listable_deals(&deals, Utc::now());
    let ranked = rank_deals(&deals, query.viewer(), &filters);

    let listings: Vec<DealListing> = ranked.into_iter().map(DealListing::from).collect();
    Ok(Json(paginate(listings, PageRequest::new(query.page, query.per_page))))
}

/// One deal card, as the detail page shows it before the wheel.
async fn get_deal(
    State(state): State<AppState>,
    ApiPath(deal_id): ApiPath<Uuid>,
    ApiQuery(viewer): ApiQuery<ViewerQuery>,
) -> Result<Json<DealListing>, AppError> {
    let deal = deal_service::fetch_deal(&state.pool, deal_id)
        .await?
        .filter(|deal| deal.is_listable(Utc::now()))
        .ok_or(AppError::NotFound("Deal"))?;

    let viewer = viewer_from(viewer.lat, viewer.lon);
    Ok(Json(DealListing::from(RankedDeal::new(deal, viewer))))
}

async fn load_spinnable_deal(state: &AppState, deal_id: Uuid) -> Result<Deal, AppError> {
    deal_service::fetch_deal(&state.pool, deal_id)
        .await?
        .filter(|deal| deal.is_spinnable(Utc::now()))
        .ok_or(AppError::NotFound("Deal"))
}

fn deal_wheel(deal: &Deal) -> Result<PrizeWheel, AppError> {
    Ok(PrizeWheel::new(deal_prizes(&deal.title, deal.discount_amount, deal.discount_type))?)
}

async fn get_deal_wheel(
    State(state): State<AppState>,
    ApiPath(deal_id): ApiPath<Uuid>,
) -> Result<Json<WheelView>, AppError> {
    let deal = load_spinnable_deal(&state, deal_id).await?;
    Ok(Json(deal_wheel(&deal)?.view(WHEEL_RADIUS)))
}

async fn get_deal_spin_status(
    State(state): State<AppState>,
    ApiPath(deal_id): ApiPath<Uuid>,
    device: DeviceId,
) -> Result<Json<SpinStatusResponse>, AppError> {
    let deal = load_spinnable_deal(&state, deal_id).await?;
    let spins_remaining = spin_service::deal_spins_remaining(&state.redis, deal.id, device.0).await?;

    Ok(Json(SpinStatusResponse { spins_remaining, cooldown_seconds: 0 }))
}

async fn spin_deal_wheel(
    State(state): State<AppState>,
    ApiPath(deal_id): ApiPath<Uuid>,
    device: DeviceId,
) -> Result<Json<SpinResponse>, AppError> {
    let deal = load_spinnable_deal(&state, deal_id).await?;
    let wheel = deal_wheel(&deal)?;

    let spins_remaining = spin_service::take_deal_spin(&state.redis, deal.id, device.0, deal.end_date)
        .await?
        .ok_or(AppError::NoSpinsRemaining { retry_after_secs: None })?;

    let outcome = wheel.spin(&mut OsRng);

    let message = if outcome.prize.is_win() {
        info!("🎡 DEAL SPIN: device {} won {} on deal {}", device.0, outcome.prize.name, deal.id);
        format!("Congratulations! You won: {}", outcome.prize.name)
    } else {
        info!("🎡 DEAL SPIN: device {} missed on deal {}", device.0, deal.id);
        "Better luck next time!".to_string()
    };

    Ok(Json(SpinResponse {
        success: true,
        outcome: Some(outcome),
        spins_remaining,
        message: Some(message),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_needs_both_halves() {
        let query = DealQuery { lat: Some(40.7), ..Default::default() };
        assert!(query.viewer().is_none());

        let query = DealQuery { lat: Some(40.7), lon: Some(-74.0), ..Default::default() };
        assert_eq!(query.viewer(), Some(Coordinate::new(40.7, -74.0)));
    }

    #[test]
    fn test_query_into_filters() {
        let query = DealQuery {
            search: Some("pizza".to_string()),
            sort_by: Some(SortKey::EndDate),
            max_distance: Some(-5.0),
            ..Default::default()
        };
        let filters = query.filters();
        assert_eq!(filters.search, "pizza");
        assert_eq!(filters.sort_by, SortKey::EndDate);
        assert_eq!(filters.discount_type, DiscountTypeFilter::All);
        assert_eq!(filters.max_distance_miles, None);
    }
}
