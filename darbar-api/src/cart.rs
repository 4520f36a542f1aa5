use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Router,
};
use darbar_order::{CartItem, CartItemUpdate, NewCartItem};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::CurrentUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub cart_item_id: String,
    #[serde(flatten)]
    pub item: CartItem,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(list_cart).post(add_to_cart))
        .route("/cart/{id}", put(update_item).delete(remove_item))
}

async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<NewCartItem>,
) -> ApiResult<Value> {
    let item = request.validate()?;
    let (cart_item_id, merged) = state.carts.add_item(&session.user_id, &item).await?;

    let (status, message) = if merged {
        (StatusCode::OK, "Cart item quantity updated")
    } else {
        (StatusCode::CREATED, "Item added to cart")
    };
    Ok(ApiResponse::with_status(status, json!({ "cartItemId": cart_item_id })).message(message))
}

async fn list_cart(State(state): State<AppState>, CurrentUser(session): CurrentUser) -> ApiResult<Vec<CartLine>> {
    let lines = state
        .carts
        .cart(&session.user_id)
        .list()
        .await?
        .into_iter()
        .map(|stored| CartLine {
            cart_item_id: stored.id,
            item: stored.value,
        })
        .collect();
    Ok(ApiResponse::ok(lines))
}

async fn update_item(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(update): Json<CartItemUpdate>,
) -> ApiResult<CartLine> {
    let cart = state.carts.cart(&session.user_id);
    let mut item = cart.get(&id).await?.ok_or_else(|| AppError::not_found("Cart item"))?;
    update.apply(&mut item)?;
    cart.put(&id, &item).await?;

    Ok(ApiResponse::ok(CartLine { cart_item_id: id, item }).message("Cart item updated"))
}

async fn remove_item(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    if !state.carts.cart(&session.user_id).delete(&id).await? {
        return Err(AppError::not_found("Cart item"));
    }
    Ok(ApiResponse::done("Item removed from cart"))
}
