use axum::{
    extract::{Multipart, State},
    routing::get,
    Router,
};
use darbar_core::storage::StoredObject;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::middleware::auth::AdminUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::upload::UploadForm;

const DEFAULT_DIRECTORY: &str = "images";

pub fn routes() -> Router<AppState> {
    Router::new().route("/img", get(list_images).post(upload_images).delete(delete_all_images))
}

async fn upload_images(State(state): State<AppState>, _admin: AdminUser, multipart: Multipart) -> ApiResult<Value> {
    let form = UploadForm::read(multipart, &state.business_rules).await?;
    let directory = form.text("directory").unwrap_or(DEFAULT_DIRECTORY).trim_matches('/').to_string();
    if directory.is_empty() || directory.contains("..") {
        return Err(AppError::ValidationError(format!("Invalid directory: {:?}", directory)));
    }

    let mut urls = Vec::new();
    for file in form.all_files() {
        urls.push(state.storage.upload(&directory, file).await?);
    }
    if urls.is_empty() {
        return Err(AppError::ValidationError("No images provided".to_string()));
    }

    tracing::info!("Uploaded {} image(s) to {}", urls.len(), directory);
    Ok(ApiResponse::created(json!({ "urls": urls })).message("Images uploaded successfully"))
}

async fn list_images(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Vec<StoredObject>> {
    let prefix = format!("{}/", DEFAULT_DIRECTORY);
    Ok(ApiResponse::ok(state.storage.list(&prefix).await?))
}

async fn delete_all_images(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Value> {
    let removed = state.storage.delete_all().await?;
    if removed == 0 {
        return Err(AppError::not_found("Images"));
    }
    tracing::warn!("Deleted all {} stored images", removed);
    Ok(ApiResponse::ok(json!({ "deleted": removed })).message("All images deleted"))
}
