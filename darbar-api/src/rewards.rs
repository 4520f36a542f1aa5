use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use darbar_order::{apply_redemption, redeem_reward, RewardLedger};
use darbar_order::rewards::POINTS_PER_REDEMPTION;
use darbar_shared::models::events::{unix_now, AuditEvent, RewardRedeemedEvent};
use darbar_shared::money::is_valid_amount;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::{AdminUser, CurrentUser};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LedgerRequest {
    pub reward: f64,
    pub dollar: f64,
}

/// `reward` is the caller's view of their balance, `dollar` the order total.
#[derive(Debug, Deserialize)]
pub struct ApplyRewardRequest {
    pub reward: f64,
    pub dollar: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedReward {
    pub total_price: f64,
    pub reward: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rewards", get(list_ledgers).post(set_ledger))
        .route("/apply-reward", post(apply_reward))
}

async fn set_ledger(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<LedgerRequest>,
) -> ApiResult<RewardLedger> {
    let ledger = RewardLedger::new(request.reward, request.dollar)?;
    let created = state.rewards.save(&ledger).await?;
    tracing::info!("Reward ledger set: {} points per ${}", ledger.reward, ledger.dollar);

    let response = if created {
        ApiResponse::with_status(StatusCode::CREATED, ledger).message("Reward values created")
    } else {
        ApiResponse::ok(ledger).message("Reward values updated")
    };
    Ok(response)
}

async fn list_ledgers(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let ledgers = state
        .rewards
        .list()
        .await?
        .into_iter()
        .map(|stored| json!({ "id": stored.id, "reward": stored.value.reward, "dollar": stored.value.dollar }))
        .collect();
    Ok(ApiResponse::ok(ledgers))
}

async fn apply_reward(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<ApplyRewardRequest>,
) -> ApiResult<AppliedReward> {
    if !is_valid_amount(request.dollar) {
        return Err(AppError::ValidationError(format!("Invalid order total: {}", request.dollar)));
    }

    let ledger = state
        .rewards
        .ledger()
        .await?
        .ok_or_else(|| AppError::not_found("Reward ledger"))?;
    let profile = state
        .users
        .get(&session.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if request.reward != profile.rewards as f64 {
        return Err(AppError::ConflictError(format!(
            "Reward balance is out of date (current balance: {})",
            profile.rewards
        )));
    }

    let redemption = redeem_reward(profile.rewards, &ledger)?;
    let total_price = apply_redemption(request.dollar, &redemption);
    state.users.set_rewards(&session.user_id, redemption.new_balance).await?;

    state
        .events
        .record(AuditEvent::RewardRedeemed(RewardRedeemedEvent {
            user_id: session.user_id.clone(),
            points_spent: POINTS_PER_REDEMPTION,
            dollar_value: redemption.dollar_value,
            new_balance: redemption.new_balance,
            timestamp: unix_now(),
        }))
        .await;

    Ok(ApiResponse::ok(AppliedReward {
        total_price,
        reward: redemption.new_balance,
    })
    .message("Reward applied successfully"))
}
