use async_trait::async_trait;
use chrono::{DateTime, Utc};
use darbar_core::payment::{CreateIntentRequest, PaymentGateway, PaymentIntent, PaymentStatus};
use darbar_core::{CoreError, CoreResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Valid amount is required")]
    InvalidAmount(i64),

    #[error("Currency is required")]
    MissingCurrency,

    #[error("Currency must be a three-letter ISO code, got '{0}'")]
    InvalidCurrency(String),

    #[error("Payment intent ID is required")]
    MissingIntentId,

    #[error("Malformed payment intent ID")]
    InvalidIntentId,

    #[error(transparent)]
    Gateway(#[from] CoreError),
}

pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    /// Create an intent for `amount` minor units, tagged with the paying user.
    pub async fn initialize_payment(
        &self,
        user_id: &str,
        amount: i64,
        currency: &str,
        now: DateTime<Utc>,
    ) -> Result<PaymentIntent, PaymentError> {
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(amount));
        }
        let currency = currency.trim().to_lowercase();
        if currency.is_empty() {
            return Err(PaymentError::MissingCurrency);
        }
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(PaymentError::InvalidCurrency(currency));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("userId".to_string(), user_id.to_string());
        metadata.insert("timestamp".to_string(), now.to_rfc3339());

        let request = CreateIntentRequest {
            amount,
            currency,
            metadata,
        };
        let intent = self.gateway.create_intent(&request).await?;
        tracing::info!("Payment intent {} created for user {}", intent.id, user_id);
        Ok(intent)
    }

    /// Current state of an intent as reported by the processor.
    pub async fn payment_status(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        let intent_id = intent_id.trim();
        if intent_id.is_empty() {
            return Err(PaymentError::MissingIntentId);
        }
        if !is_intent_id(intent_id) {
            return Err(PaymentError::InvalidIntentId);
        }
        Ok(self.gateway.retrieve_intent(intent_id).await?)
    }
}

/// `pi_` followed by ASCII letters and digits, safe to place in a URL path.
pub fn is_intent_id(id: &str) -> bool {
    id.strip_prefix("pi_")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric()))
}

/// In-process payment processor. Intents succeed when retrieved; an amount of
/// `MockPaymentGateway::FAILING_AMOUNT` simulates a processor outage.
#[derive(Default)]
pub struct MockPaymentGateway {
    intents: Mutex<HashMap<String, PaymentIntent>>,
}

impl MockPaymentGateway {
    pub const FAILING_AMOUNT: i64 = 999_999;

    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CoreError {
    CoreError::InternalError("mock payment store poisoned".to_string())
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_intent(&self, request: &CreateIntentRequest) -> CoreResult<PaymentIntent> {
        if request.amount == Self::FAILING_AMOUNT {
            return Err(CoreError::gateway("payments", "Simulated Payment Gateway Failure"));
        }

        let id = format!("pi_mock{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret_mock", id)),
            id: id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            status: PaymentStatus::RequiresPaymentMethod,
            created: Utc::now().timestamp(),
            metadata: request.metadata.clone(),
        };
        self.intents.lock().map_err(|_| poisoned())?.insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> CoreResult<PaymentIntent> {
        let mut intents = self.intents.lock().map_err(|_| poisoned())?;
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| CoreError::NotFound("Payment intent".to_string()))?;
        intent.status = PaymentStatus::Succeeded;
        Ok(intent.clone())
    }
}
