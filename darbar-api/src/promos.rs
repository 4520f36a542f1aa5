use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use darbar_offer::{validate_promo, NewPromo, PromoSummary, PromoValidation};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::AdminUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePromoRequest {
    #[serde(default)]
    pub promo_code: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create-promo", post(create_promo))
        .route("/validate-promo", post(check_promo))
        .route("/get-all-promos", get(list_promos))
}

async fn create_promo(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<NewPromo>,
) -> ApiResult<PromoSummary> {
    let (code, promo) = request.validate()?;
    state.promos.create(&code, &promo).await?;
    tracing::info!("Promo {} created, expires {}", code, promo.expiration_date);
    Ok(ApiResponse::created(PromoSummary::new(&code, &promo)).message("Promo code created successfully"))
}

/// A rejected code is still a 200; the outcome is carried in `success`.
async fn check_promo(
    State(state): State<AppState>,
    Json(request): Json<ValidatePromoRequest>,
) -> Result<axum::Json<Value>, AppError> {
    let code = request.promo_code.trim();
    if code.is_empty() {
        return Err(AppError::ValidationError("Promo code is required".to_string()));
    }

    let promo = if code.contains('/') {
        None
    } else {
        state.promos.find(code).await?
    };
    let status = StatusCode::OK.as_u16();

    let body = match validate_promo(promo.as_ref(), Utc::now()) {
        PromoValidation::Valid { discount } => json!({
            "success": true,
            "statusCode": status,
            "finalDiscount": discount,
            "data": { "finalDiscount": discount },
        }),
        rejected => json!({
            "success": false,
            "statusCode": status,
            "message": rejected.message(),
            "data": null,
        }),
    };
    Ok(axum::Json(body))
}

async fn list_promos(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Vec<PromoSummary>> {
    let promos: Vec<PromoSummary> = state
        .promos
        .list()
        .await?
        .iter()
        .map(|stored| PromoSummary::new(&stored.id, &stored.value))
        .collect();
    if promos.is_empty() {
        return Err(AppError::not_found("Promo codes"));
    }
    Ok(ApiResponse::ok(promos))
}
