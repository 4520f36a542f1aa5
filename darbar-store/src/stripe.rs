use async_trait::async_trait;
use darbar_core::payment::{CreateIntentRequest, PaymentGateway, PaymentIntent};
use darbar_core::{CoreError, CoreResult};
use serde::Deserialize;
use tracing::{error, info, warn};

const SERVICE: &str = "Stripe";

/// Payment intents through the Stripe REST API.
pub struct StripeGateway {
    secret_key: String,
    url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    message: String,
}

/// Only processor-side trouble is a gateway error; declines and rejected
/// input belong to the caller.
fn rejection(status: reqwest::StatusCode, kind: &str, message: String) -> CoreError {
    if status == reqwest::StatusCode::NOT_FOUND {
        return CoreError::NotFound("Payment intent".to_string());
    }
    if status == reqwest::StatusCode::PAYMENT_REQUIRED || kind == "card_error" {
        return CoreError::PaymentDeclined(message);
    }
    let our_side = matches!(
        status,
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN | reqwest::StatusCode::TOO_MANY_REQUESTS
    );
    if status.is_client_error() && !our_side {
        return CoreError::ValidationError(message);
    }
    CoreError::gateway(SERVICE, message)
}

fn transport_error(err: reqwest::Error) -> CoreError {
    error!("Stripe request failed: {}", err);
    CoreError::gateway(SERVICE, "Payment processor unavailable")
}

impl StripeGateway {
    pub fn new(secret_key: String, url: String) -> Self {
        Self {
            secret_key,
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn read_intent(response: reqwest::Response) -> CoreResult<PaymentIntent> {
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            let (kind, message) = serde_json::from_str::<StripeErrorBody>(&body)
                .map(|e| (e.error.kind, e.error.message))
                .unwrap_or_else(|_| (String::new(), format!("HTTP {}", status)));
            if status.is_server_error() {
                error!("Stripe failed request ({}): {}", status, message);
            } else {
                warn!("Stripe rejected request ({} {}): {}", status, kind, message);
            }
            return Err(rejection(status, &kind, message));
        }
        serde_json::from_str(&body)
            .map_err(|e| CoreError::gateway(SERVICE, format!("Bad response format: {}", e)))
    }
}

/// Stripe's form encoding, with metadata as `metadata[key]=value`.
pub fn intent_form(request: &CreateIntentRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), request.amount.to_string()),
        ("currency".to_string(), request.currency.clone()),
        ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
    ];
    for (key, value) in &request.metadata {
        form.push((format!("metadata[{}]", key), value.clone()));
    }
    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: &CreateIntentRequest) -> CoreResult<PaymentIntent> {
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.url))
            .bearer_auth(&self.secret_key)
            .form(&intent_form(request))
            .send()
            .await
            .map_err(transport_error)?;

        let intent = Self::read_intent(response).await?;
        info!("Stripe intent {} created ({} {})", intent.id, intent.amount, intent.currency);
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> CoreResult<PaymentIntent> {
        let mut url = reqwest::Url::parse(&format!("{}/v1/payment_intents", self.url))
            .map_err(|e| CoreError::InternalError(format!("Bad Stripe URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CoreError::InternalError("Bad Stripe URL".to_string()))?
            .push(intent_id);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(transport_error)?;

        Self::read_intent(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use darbar_core::payment::PaymentStatus;
    use std::collections::BTreeMap;

    #[test]
    fn test_intent_form() {
        let mut metadata = BTreeMap::new();
        metadata.insert("userId".to_string(), "u1".to_string());
        let form = intent_form(&CreateIntentRequest {
            amount: 2599,
            currency: "usd".to_string(),
            metadata,
        });
        assert!(form.contains(&("amount".to_string(), "2599".to_string())));
        assert!(form.contains(&("metadata[userId]".to_string(), "u1".to_string())));
    }

    #[test]
    fn test_rejections_by_cause() {
        use reqwest::StatusCode;
        assert!(matches!(
            rejection(StatusCode::BAD_REQUEST, "invalid_request_error", "Invalid currency: xyz".into()),
            CoreError::ValidationError(_)
        ));
        assert!(matches!(
            rejection(StatusCode::PAYMENT_REQUIRED, "card_error", "Your card was declined.".into()),
            CoreError::PaymentDeclined(_)
        ));
        assert!(matches!(rejection(StatusCode::NOT_FOUND, "invalid_request_error", "No such payment_intent".into()), CoreError::NotFound(_)));
        assert!(matches!(rejection(StatusCode::UNAUTHORIZED, "invalid_request_error", "Invalid API Key".into()), CoreError::GatewayError { .. }));
        assert!(matches!(rejection(StatusCode::BAD_GATEWAY, "api_error", "upstream".into()), CoreError::GatewayError { .. }));
    }

    #[test]
    fn test_intent_response_shape() {
        let body = r#"{
            "id": "pi_123", "object": "payment_intent", "amount": 2599, "currency": "usd",
            "status": "requires_payment_method", "client_secret": "pi_123_secret_abc",
            "created": 1700000000, "metadata": {"userId": "u1"}
        }"#;
        let intent: PaymentIntent = serde_json::from_str(body).unwrap();
        assert_eq!(intent.status, PaymentStatus::RequiresPaymentMethod);
        assert_eq!(intent.metadata.get("userId").map(String::as_str), Some("u1"));
    }
}
