use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use darbar_core::user::{ProfileUpdate, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::{AdminUser, CurrentUser};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::upload::UploadForm;

/// A profile together with its uid.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub user_id: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

impl UserView {
    pub fn new(user_id: String, profile: UserProfile) -> Self {
        Self { user_id, profile }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldMemberRequest {
    #[serde(default = "yes")]
    pub gold_member: bool,
}

fn yes() -> bool {
    true
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/{id}", get(get_user).put(update_user))
        .route("/getUsers", get(list_users))
        .route("/userImg", post(upload_user_image))
        .route("/user/goldMember/{id}", put(set_gold_member))
        .route("/userReward", get(user_reward))
}

async fn get_user(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<UserView> {
    session.ensure_can_access(&id, "User")?;
    let profile = state.users.get(&id).await?.ok_or_else(|| AppError::not_found("User"))?;
    Ok(ApiResponse::ok(UserView::new(id, profile)))
}

async fn update_user(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<UserView> {
    session.ensure_can_access(&id, "User")?;
    if update.is_empty() {
        return Err(AppError::ValidationError("No valid fields to update".to_string()));
    }
    update.validate().map_err(AppError::InvalidFields)?;

    let mut profile = state.users.get(&id).await?.ok_or_else(|| AppError::not_found("User"))?;
    update.apply(&mut profile, Utc::now());
    state.users.save(&id, &profile).await?;

    tracing::info!("Profile updated: {}", id);
    Ok(ApiResponse::ok(UserView::new(id, profile)).message("User updated successfully"))
}

async fn list_users(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Vec<UserView>> {
    let users = state
        .users
        .list()
        .await?
        .into_iter()
        .map(|stored| UserView::new(stored.id, stored.value))
        .collect();
    Ok(ApiResponse::ok(users))
}

async fn upload_user_image(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = UploadForm::read(multipart, &state.business_rules).await?;
    let file = form
        .file("image")
        .ok_or_else(|| AppError::ValidationError("No image file provided".to_string()))?;

    let profile = state
        .users
        .get(&session.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let url = state.storage.upload("users", file).await?;
    state.users.set_image(&session.user_id, &url, Utc::now()).await?;

    if let Some(previous) = profile.image.filter(|old| !old.is_empty()) {
        if let Err(e) = state.storage.delete(&previous).await {
            tracing::warn!("Could not delete previous profile image {}: {}", previous, e);
        }
    }

    Ok(ApiResponse::ok(json!({ "imageUrl": url })).message("Profile image updated"))
}

async fn set_gold_member(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(request): Json<GoldMemberRequest>,
) -> ApiResult<Value> {
    state.users.set_gold_member(&id, request.gold_member, Utc::now()).await?;
    tracing::info!("Gold membership for {} set to {}", id, request.gold_member);
    Ok(ApiResponse::ok(json!({ "userId": id, "goldMember": request.gold_member }))
        .message("Gold membership updated"))
}

async fn user_reward(State(state): State<AppState>, CurrentUser(session): CurrentUser) -> ApiResult<Value> {
    let profile = state
        .users
        .get(&session.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(ApiResponse::ok(json!({ "userId": session.user_id, "rewards": profile.rewards })))
}
