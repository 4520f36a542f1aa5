use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Router,
};
use chrono::Utc;
use darbar_core::session::Session;
use darbar_order::{accrue_rewards, customer_cancel, daily_summary, transition, NewOrder, Order, OrderStatus};
use darbar_shared::models::events::{unix_now, AuditEvent, OrderPlacedEvent, OrderStatusChangedEvent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::{AdminUser, CurrentUser};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: String,
    #[serde(flatten)]
    pub order: Order,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: String,
    pub order_data: Order,
    pub rewards_earned: u64,
    pub new_reward_value: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub order_status: OrderStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(place_order))
        .route("/ordersByUser", get(orders_by_user))
        .route("/orders/{id}", get(get_order).patch(update_own_order))
        .route("/ordersAdmin/{id}", patch(update_order_status))
        .route("/orders-total-count", get(total_count))
        .route("/daily-summary", get(summary))
}

fn views(orders: Vec<darbar_core::store::Stored<Order>>) -> Vec<OrderView> {
    orders
        .into_iter()
        .map(|stored| OrderView {
            order_id: stored.id,
            order: stored.value,
        })
        .collect()
}

async fn place_order(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<NewOrder>,
) -> ApiResult<PlacedOrder> {
    let order = request.into_order(&session.user_id, Utc::now())?;

    // Everything that can reject the order is checked before the first write.
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
    let earned = accrue_rewards(order.total_price, ledger.dollar)?;

    let order_id = state.orders.create(&order).await?;
    let new_balance = profile.rewards.saturating_add(earned);
    state.users.set_rewards(&session.user_id, new_balance).await?;

    let cleared = state.carts.clear(&session.user_id).await?;
    tracing::info!(
        "Order {} placed by {}: {} item(s), {} points earned, {} cart line(s) cleared",
        order_id,
        session.user_id,
        order.item_count(),
        earned,
        cleared
    );

    state
        .events
        .record(AuditEvent::OrderPlaced(OrderPlacedEvent {
            order_id: order_id.clone(),
            user_id: session.user_id.clone(),
            total_price: order.total_price,
            rewards_earned: earned,
            timestamp: unix_now(),
        }))
        .await;

    Ok(ApiResponse::created(PlacedOrder {
        order_id,
        order_data: order,
        rewards_earned: earned,
        new_reward_value: new_balance,
    })
    .message("Order placed successfully"))
}

async fn list_orders(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Vec<OrderView>> {
    Ok(ApiResponse::ok(views(state.orders.list().await?)))
}

async fn orders_by_user(State(state): State<AppState>, CurrentUser(session): CurrentUser) -> ApiResult<Vec<OrderView>> {
    Ok(ApiResponse::ok(views(state.orders.for_user(&session.user_id).await?)))
}

async fn load_visible(state: &AppState, session: &Session, id: &str) -> Result<Order, AppError> {
    let order = state.orders.get(id).await?.ok_or_else(|| AppError::not_found("Order"))?;
    session.ensure_can_access(&order.user_id, "Order")?;
    Ok(order)
}

async fn get_order(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<OrderView> {
    let order = load_visible(&state, &session, &id).await?;
    Ok(ApiResponse::ok(OrderView { order_id: id, order }))
}

async fn save_status_change(
    state: &AppState,
    session: &Session,
    id: String,
    order: Order,
    from: OrderStatus,
) -> ApiResult<OrderView> {
    state.orders.save(&id, &order).await?;
    state
        .events
        .record(AuditEvent::OrderStatusChanged(OrderStatusChangedEvent {
            order_id: id.clone(),
            from: from.as_str().to_string(),
            to: order.order_status.as_str().to_string(),
            changed_by: session.user_id.clone(),
            timestamp: unix_now(),
        }))
        .await;

    Ok(ApiResponse::ok(OrderView { order_id: id, order }).message("Order status updated"))
}

async fn update_own_order(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<OrderView> {
    let mut order = load_visible(&state, &session, &id).await?;
    let from = order.order_status;
    if session.is_admin() {
        transition(&mut order, request.order_status, Utc::now())?;
    } else {
        customer_cancel(&mut order, request.order_status, Utc::now())?;
    }
    save_status_change(&state, &session, id, order, from).await
}

async fn update_order_status(
    State(state): State<AppState>,
    AdminUser(session): AdminUser,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<OrderView> {
    let mut order = state.orders.get(&id).await?.ok_or_else(|| AppError::not_found("Order"))?;
    let from = order.order_status;
    transition(&mut order, request.order_status, Utc::now())?;
    save_status_change(&state, &session, id, order, from).await
}

async fn total_count(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Value> {
    Ok(ApiResponse::ok(json!({ "totalOrders": state.orders.count().await? })))
}

async fn summary(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<BTreeMap<String, u64>> {
    let orders = state.orders.list().await?;
    if orders.is_empty() {
        return Err(AppError::not_found("Orders"));
    }
    Ok(ApiResponse::ok(daily_summary(orders.iter().map(|stored| &stored.value))))
}
