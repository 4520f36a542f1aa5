use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use darbar_core::payment::PaymentIntent;
use darbar_core::session::Session;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::CurrentUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIntentBody {
    /// Smallest currency unit.
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentBody {
    #[serde(default)]
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedIntent {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/confirm-payment", post(confirm_payment))
        .route("/payment/{payment_intent_id}", get(payment_details))
}

/// Intents are tagged with the paying user; nobody else may look at them.
/// Untagged intents were not made here and stay admin-only.
fn ensure_owner(session: &Session, intent: &PaymentIntent) -> Result<(), AppError> {
    match intent.metadata.get("userId") {
        Some(owner) => Ok(session.ensure_can_access(owner, "Payment intent")?),
        None if session.is_admin() => Ok(()),
        None => Err(AppError::not_found("Payment intent")),
    }
}

async fn create_payment_intent(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<CreateIntentBody>,
) -> ApiResult<CreatedIntent> {
    let currency = body
        .currency
        .unwrap_or_else(|| state.business_rules.default_currency.clone());
    let intent = state
        .payments
        .initialize_payment(&session.user_id, body.amount, &currency, Utc::now())
        .await?;

    Ok(ApiResponse::ok(CreatedIntent {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
        amount: intent.amount,
        currency: intent.currency,
    })
    .message("Payment intent created"))
}

async fn confirm_payment(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<ConfirmPaymentBody>,
) -> ApiResult<Value> {
    let intent = state.payments.payment_status(&body.payment_intent_id).await?;
    ensure_owner(&session, &intent)?;
    Ok(ApiResponse::ok(json!({
        "status": intent.status,
        "amount": intent.amount,
        "currency": intent.currency,
    })))
}

async fn payment_details(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(payment_intent_id): Path<String>,
) -> ApiResult<PaymentIntent> {
    let intent = state.payments.payment_status(&payment_intent_id).await?;
    ensure_owner(&session, &intent)?;
    Ok(ApiResponse::ok(intent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use darbar_core::payment::PaymentStatus;
    use darbar_core::session::Role;
    use std::collections::BTreeMap;

    fn session(user_id: &str, role: Role) -> Session {
        Session {
            user_id: user_id.to_string(),
            email: format!("{}@darbar.test", user_id),
            role,
        }
    }

    fn intent(owner: Option<&str>) -> PaymentIntent {
        let mut metadata = BTreeMap::new();
        if let Some(owner) = owner {
            metadata.insert("userId".to_string(), owner.to_string());
        }
        PaymentIntent {
            id: "pi_abc".to_string(),
            amount: 2599,
            currency: "usd".to_string(),
            status: PaymentStatus::Succeeded,
            client_secret: None,
            created: 1_700_000_000,
            metadata,
        }
    }

    #[test]
    fn test_untagged_intent_is_admin_only() {
        let untagged = intent(None);
        assert!(matches!(
            ensure_owner(&session("u1", Role::User), &untagged),
            Err(AppError::NotFoundError(_))
        ));
        assert!(ensure_owner(&session("a1", Role::Admin), &untagged).is_ok());

        let tagged = intent(Some("u1"));
        assert!(ensure_owner(&session("u1", Role::User), &tagged).is_ok());
        assert!(ensure_owner(&session("u2", Role::User), &tagged).is_err());
    }
}
