use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use darbar_catalog::{GoldPriceSetting, GoldPricing};
use darbar_shared::models::events::{unix_now, AuditEvent, GoldPriceChangedEvent};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::AdminUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRepriceRequest {
    #[serde(default)]
    pub category: String,
    pub percent: f64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/goldPrice", get(get_gold_price).post(set_gold_price))
        .route("/goldDiscountApply", put(apply_gold_price))
        .route("/updateDishesGoldPrice", put(reprice_category))
}

async fn record_repricing(state: &AppState, pricing: &GoldPricing, repriced: usize, scope: Option<String>) {
    state
        .events
        .record(AuditEvent::GoldPriceChanged(GoldPriceChangedEvent {
            percent: pricing.percent(),
            dishes_repriced: repriced,
            scope,
            timestamp: unix_now(),
        }))
        .await;
}

async fn set_gold_price(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(setting): Json<GoldPriceSetting>,
) -> ApiResult<Value> {
    let pricing = GoldPricing::new(setting.gold_price)?;
    state.catalog.set_gold_price(&pricing.setting()).await?;
    let repriced = state.catalog.reprice_all(&pricing).await?;
    record_repricing(&state, &pricing, repriced, None).await;

    Ok(ApiResponse::created(json!({ "goldPrice": pricing.percent(), "dishesUpdated": repriced }))
        .message("Gold price set and dishes updated successfully"))
}

async fn get_gold_price(State(state): State<AppState>) -> ApiResult<GoldPriceSetting> {
    let setting = state
        .catalog
        .gold_price()
        .await?
        .ok_or_else(|| AppError::not_found("Gold price"))?;
    Ok(ApiResponse::ok(setting))
}

async fn apply_gold_price(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Value> {
    let setting = state
        .catalog
        .gold_price()
        .await?
        .ok_or_else(|| AppError::not_found("Gold price"))?;
    let pricing = GoldPricing::from_setting(Some(&setting))?;
    let repriced = state.catalog.reprice_all(&pricing).await?;
    record_repricing(&state, &pricing, repriced, None).await;

    Ok(ApiResponse::ok(json!({ "goldPrice": pricing.percent(), "dishesUpdated": repriced }))
        .message("Gold discount applied to all dishes"))
}

async fn reprice_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<CategoryRepriceRequest>,
) -> ApiResult<Value> {
    if request.category.trim().is_empty() {
        return Err(AppError::ValidationError("Category is required".to_string()));
    }
    let pricing = GoldPricing::new(request.percent)?;
    let repriced = state.catalog.reprice_category(&request.category, &pricing).await?;
    if repriced == 0 {
        return Err(AppError::not_found("Dishes in category"));
    }
    record_repricing(&state, &pricing, repriced, Some(request.category.clone())).await;

    Ok(ApiResponse::ok(json!({
        "category": request.category,
        "percent": pricing.percent(),
        "dishesUpdated": repriced,
    }))
    .message("Gold prices updated for category"))
}
