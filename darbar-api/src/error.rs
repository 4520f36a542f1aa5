use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use darbar_catalog::{CatalogError, PricingError};
use darbar_core::{CoreError, FieldError};
use darbar_offer::{GameError, PromoError};
use darbar_order::{OrderError, PaymentError, RewardError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Validation failed")]
    InvalidFields(Vec<FieldError>),
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    PaymentError(String),
    #[error("{0}")]
    ExternalServiceError(String),
    #[error("{0}")]
    RateLimitError(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    InternalServerError(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFoundError(format!("{} not found", what))
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            AppError::AuthorizationError(_) => StatusCode::FORBIDDEN,
            AppError::NotFoundError(_) => StatusCode::NOT_FOUND,
            AppError::ConflictError(_) => StatusCode::CONFLICT,
            AppError::PaymentError(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::RateLimitError(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError(_) | AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidFields(_) => "VALIDATION_ERROR",
            AppError::AuthenticationError(_) => "AUTHENTICATION_ERROR",
            AppError::AuthorizationError(_) => "AUTHORIZATION_ERROR",
            AppError::NotFoundError(_) => "NOT_FOUND",
            AppError::ConflictError(_) => "CONFLICT",
            AppError::PaymentError(_) => "PAYMENT_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::RateLimitError(_) => "RATE_LIMIT_EXCEEDED",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::InternalServerError(_) | AppError::Anyhow(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.error_code();
        let message = match &self {
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("{}: {}", error_code, msg);
                msg.clone()
            }
            AppError::ExternalServiceError(msg) => {
                tracing::error!("{}: {}", error_code, msg);
                msg.clone()
            }
            err if status.is_server_error() => {
                tracing::error!("{}: {}", error_code, err);
                "Internal Server Error".to_string()
            }
            err => {
                tracing::warn!("{}: {}", error_code, err);
                err.to_string()
            }
        };

        let mut body = json!({
            "success": false,
            "statusCode": status.as_u16(),
            "errorCode": error_code,
            "message": message,
            "timestamp": Utc::now().to_rfc3339(),
        });
        if let AppError::InvalidFields(errors) = self {
            body["errors"] = json!(errors);
        }

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            CoreError::InvalidFields(errors) => AppError::InvalidFields(errors),
            CoreError::NotFound(what) => AppError::not_found(&what),
            CoreError::Conflict(msg) => AppError::ConflictError(msg),
            CoreError::InvalidCredentials => AppError::AuthenticationError("Invalid email or password".to_string()),
            CoreError::GatewayError { service, message } => {
                AppError::ExternalServiceError(format!("{} service error: {}", service, message))
            }
            CoreError::PaymentDeclined(msg) => AppError::PaymentError(msg),
            CoreError::StoreError(msg) | CoreError::InternalError(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<PromoError> for AppError {
    fn from(err: PromoError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<GameError> for AppError {
    fn from(err: GameError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<RewardError> for AppError {
    fn from(err: RewardError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Invalid(msg) => AppError::ValidationError(msg),
            transition @ OrderError::InvalidTransition { .. } => AppError::ConflictError(transition.to_string()),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Gateway(inner) => AppError::from(inner),
            other => AppError::ValidationError(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::ValidationError(format!("Invalid multipart body: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(CoreError::NotFound("Order".into())).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(CoreError::InvalidCredentials).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::from(CoreError::gateway("Pushy", "down")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(PaymentError::Gateway(CoreError::PaymentDeclined("card declined".into()))).status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::from(PaymentError::Gateway(CoreError::gateway("Stripe", "unavailable"))).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(PaymentError::Gateway(CoreError::ValidationError("Invalid currency".into()))).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(PaymentError::Gateway(CoreError::NotFound("Payment intent".into()))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::from(PaymentError::MissingCurrency).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        let err = OrderError::InvalidTransition {
            from: "DELIVERED",
            to: "PENDING",
        };
        assert_eq!(AppError::from(err).status(), StatusCode::CONFLICT);
    }
}
