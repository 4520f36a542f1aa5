use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use darbar_core::push::{Notification, PushMessage};
use darbar_shared::models::events::{unix_now, AuditEvent, NotificationSentEvent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::AdminUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreTokenRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub notification_id: String,
    #[serde(flatten)]
    pub notification: Notification,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/send-notification", post(send_notification))
        .route("/notifications", get(list_notifications))
        .route("/store-token", post(store_token))
}

async fn send_notification(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<SendNotificationRequest>,
) -> ApiResult<Value> {
    let title = request.title.trim();
    let body = request.body.trim();
    if title.is_empty() || body.is_empty() {
        return Err(AppError::ValidationError("Title and body are required".to_string()));
    }

    let tokens = state.notifications.tokens().await?;
    if tokens.is_empty() {
        return Err(AppError::not_found("Device tokens"));
    }

    let message = PushMessage {
        title: title.to_string(),
        body: body.to_string(),
    };
    let receipts = state.push.send(&message, &tokens).await?;

    let notification_id = state
        .notifications
        .record(&Notification {
            title: message.title.clone(),
            body: message.body.clone(),
            timestamp: Utc::now(),
        })
        .await?;

    state
        .events
        .record(AuditEvent::NotificationSent(NotificationSentEvent {
            notification_id: notification_id.clone(),
            title: message.title,
            delivered: receipts.len(),
            timestamp: unix_now(),
        }))
        .await;

    Ok(ApiResponse::ok(json!({ "notificationId": notification_id, "delivered": receipts.len() }))
        .message("Notification sent successfully"))
}

async fn list_notifications(State(state): State<AppState>) -> ApiResult<Vec<NotificationView>> {
    let feed = state
        .notifications
        .feed()
        .await?
        .into_iter()
        .map(|stored| NotificationView {
            notification_id: stored.id,
            notification: stored.value,
        })
        .collect();
    Ok(ApiResponse::ok(feed))
}

async fn store_token(State(state): State<AppState>, Json(request): Json<StoreTokenRequest>) -> ApiResult<Value> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(AppError::ValidationError("Token is required".to_string()));
    }
    state.notifications.store_token(token).await?;
    Ok(ApiResponse::done("Token stored successfully"))
}
