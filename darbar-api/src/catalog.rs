use axum::{
    extract::{Multipart, Path, State},
    routing::{get, patch, post, put},
    Router,
};
use darbar_catalog::{Category, DishDraft, DishRecord, DishUpdate, DishView};
use darbar_core::session::Session;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::{AdminUser, CurrentUser, MaybeUser};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::upload::UploadForm;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub discount: f64,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{category}", axum::routing::delete(delete_category))
        .route("/dishes", post(create_dish).get(all_dishes))
        .route("/dishes/category/{category}", get(dishes_by_category))
        .route("/dishes/admin/{category}", get(admin_dishes))
        .route("/dishes/{category}/{id}", put(update_dish).delete(delete_dish))
        .route("/dishes/discount/{category}/{id}", put(apply_discount))
        .route("/specialOffers", get(special_offers))
        .route("/availability", patch(toggle_availability))
}

/// Whether the caller sees member prices.
pub async fn is_gold_member(state: &AppState, session: Option<&Session>) -> Result<bool, AppError> {
    let Some(session) = session else {
        return Ok(false);
    };
    Ok(state
        .users
        .get(&session.user_id)
        .await?
        .map(|profile| profile.gold_member)
        .unwrap_or(false))
}

async fn remove_image(state: &AppState, url: &str) {
    if url.is_empty() {
        return;
    }
    if let Err(e) = state.storage.delete(url).await {
        tracing::warn!("Could not delete image {}: {}", url, e);
    }
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(ApiResponse::ok(state.catalog.category_names().await?))
}

async fn create_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<Category> {
    let category = Category::new(&request.name)?;
    let categories = state.catalog.categories();
    if categories.exists(&category.name).await? {
        return Err(AppError::ConflictError(format!("Category {} already exists", category.name)));
    }
    categories.put(&category.name, &category).await?;
    tracing::info!("Category created: {}", category.name);
    Ok(ApiResponse::created(category).message("Category created successfully"))
}

async fn delete_category(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(category): Path<String>,
) -> ApiResult<Value> {
    let images = state.catalog.delete_category(&category).await?;
    for image in &images {
        remove_image(&state, image).await;
    }
    tracing::info!("Category {} deleted with {} image(s)", category, images.len());
    Ok(ApiResponse::done(format!("Category {} deleted", category)))
}

async fn create_dish(State(state): State<AppState>, _admin: AdminUser, multipart: Multipart) -> ApiResult<DishRecord> {
    let form = UploadForm::read(multipart, &state.business_rules).await?;
    let draft: DishDraft = form
        .json("dishData")?
        .ok_or_else(|| AppError::ValidationError("dishData is required".to_string()))?;

    let pricing = state.catalog.current_pricing().await?;
    let (category, mut dish) = draft.into_dish(&pricing, None)?;

    if let Some(file) = form.file("image") {
        dish.image = state.storage.upload("dishes", file).await?;
    }

    state.catalog.ensure_category(&category).await?;
    let dish_id = state.catalog.dishes(&category).insert(&dish).await?;
    tracing::info!("Dish {} created in {}", dish_id, category);

    Ok(ApiResponse::created(DishRecord { dish_id, dish }).message("Dish added successfully"))
}

async fn dishes_by_category(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Path(category): Path<String>,
) -> ApiResult<Vec<DishView>> {
    let gold = is_gold_member(&state, session.as_ref()).await?;
    let dishes = state
        .catalog
        .dishes(&category)
        .list()
        .await?
        .iter()
        .filter_map(|stored| stored.value.for_customer(&stored.id, None, gold))
        .collect();
    Ok(ApiResponse::ok(dishes))
}

async fn all_dishes(State(state): State<AppState>, CurrentUser(session): CurrentUser) -> ApiResult<Vec<DishView>> {
    let gold = is_gold_member(&state, Some(&session)).await?;
    let dishes: Vec<DishView> = state
        .catalog
        .all_dishes()
        .await?
        .iter()
        .filter_map(|(category, stored)| stored.value.for_customer(&stored.id, Some(category), gold))
        .collect();

    if dishes.is_empty() {
        return Err(AppError::not_found("Dishes"));
    }
    Ok(ApiResponse::ok(dishes))
}

async fn admin_dishes(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(category): Path<String>,
) -> ApiResult<Vec<DishRecord>> {
    let dishes = state
        .catalog
        .dishes(&category)
        .list()
        .await?
        .into_iter()
        .map(|stored| DishRecord {
            dish_id: stored.id,
            dish: stored.value,
        })
        .collect();
    Ok(ApiResponse::ok(dishes))
}

async fn update_dish(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((category, id)): Path<(String, String)>,
    multipart: Multipart,
) -> ApiResult<DishRecord> {
    let form = UploadForm::read(multipart, &state.business_rules).await?;
    let mut update: DishUpdate = form.json("dishData")?.unwrap_or_default();

    let dishes = state.catalog.dishes(&category);
    let mut dish = dishes.get(&id).await?.ok_or_else(|| AppError::not_found("Dish"))?;
    let previous_image = dish.image.clone();

    if let Some(file) = form.file("image") {
        update.image = Some(state.storage.upload("dishes", file).await?);
    }

    let pricing = state.catalog.current_pricing().await?;
    update.apply(&mut dish, &pricing)?;
    dishes.put(&id, &dish).await?;

    if dish.image != previous_image {
        remove_image(&state, &previous_image).await;
    }

    tracing::info!("Dish {} in {} updated", id, category);
    Ok(ApiResponse::ok(DishRecord { dish_id: id, dish }).message("Dish updated successfully"))
}

async fn delete_dish(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((category, id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let dishes = state.catalog.dishes(&category);
    let dish = dishes.get(&id).await?.ok_or_else(|| AppError::not_found("Dish"))?;
    dishes.delete(&id).await?;
    remove_image(&state, &dish.image).await;

    tracing::info!("Dish {} deleted from {}", id, category);
    Ok(ApiResponse::done("Dish deleted successfully"))
}

async fn apply_discount(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((category, id)): Path<(String, String)>,
    Json(request): Json<DiscountRequest>,
) -> ApiResult<DishRecord> {
    let dishes = state.catalog.dishes(&category);
    let mut dish = dishes.get(&id).await?.ok_or_else(|| AppError::not_found("Dish"))?;
    dish.apply_discount(request.discount)?;
    dishes.put(&id, &dish).await?;

    tracing::info!("Discount of {}% applied to {}", request.discount, id);
    Ok(ApiResponse::ok(DishRecord { dish_id: id, dish }).message("Discount applied successfully"))
}

async fn special_offers(State(state): State<AppState>) -> ApiResult<Vec<DishView>> {
    let offers = state
        .catalog
        .all_dishes()
        .await?
        .iter()
        .filter_map(|(category, stored)| stored.value.as_special_offer(&stored.id, category))
        .collect();
    Ok(ApiResponse::ok(offers))
}

async fn toggle_availability(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<AvailabilityRequest>,
) -> ApiResult<Value> {
    if request.category.trim().is_empty() || request.id.trim().is_empty() {
        return Err(AppError::ValidationError("category and id are required".to_string()));
    }
    let dishes = state.catalog.dishes(&request.category);
    let mut dish = dishes.get(&request.id).await?.ok_or_else(|| AppError::not_found("Dish"))?;
    let available = dish.toggle_availability();
    dishes.put(&request.id, &dish).await?;

    Ok(ApiResponse::ok(json!({ "dishId": request.id, "available": available })).message("Availability updated"))
}
