use axum::{
    extract::{Multipart, Path, State},
    routing::get,
    Router,
};
use darbar_catalog::{Location, LocationDraft};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::middleware::auth::AdminUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::upload::UploadForm;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    pub location_id: String,
    #[serde(flatten)]
    pub location: Location,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations).post(create_location))
        .route(
            "/locations/{id}",
            get(get_location).put(update_location).delete(delete_location),
        )
}

fn draft(form: &UploadForm) -> LocationDraft {
    LocationDraft {
        name: form.text("name").map(str::to_string),
        address: form.text("address").map(str::to_string),
    }
}

async fn create_location(
    State(state): State<AppState>,
    _admin: AdminUser,
    multipart: Multipart,
) -> ApiResult<LocationView> {
    let form = UploadForm::read(multipart, &state.business_rules).await?;
    let mut location = draft(&form).into_location(String::new())?;
    if let Some(file) = form.file("image") {
        location.image = state.storage.upload("locations", file).await?;
    }

    let location_id = state.catalog.locations().insert(&location).await?;
    tracing::info!("Location {} created: {}", location_id, location.name);
    Ok(ApiResponse::created(LocationView { location_id, location }).message("Location created successfully"))
}

async fn list_locations(State(state): State<AppState>) -> ApiResult<Vec<LocationView>> {
    let locations = state
        .catalog
        .locations()
        .list()
        .await?
        .into_iter()
        .map(|stored| LocationView {
            location_id: stored.id,
            location: stored.value,
        })
        .collect();
    Ok(ApiResponse::ok(locations))
}

async fn get_location(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<LocationView> {
    let location = state
        .catalog
        .locations()
        .get(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Location"))?;
    Ok(ApiResponse::ok(LocationView { location_id: id, location }))
}

async fn update_location(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<LocationView> {
    let form = UploadForm::read(multipart, &state.business_rules).await?;
    let locations = state.catalog.locations();
    let existing = locations.get(&id).await?.ok_or_else(|| AppError::not_found("Location"))?;

    let update = draft(&form);
    let mut location = LocationDraft {
        name: update.name.or(Some(existing.name)),
        address: update.address.or(Some(existing.address)),
    }
    .into_location(existing.image.clone())?;

    if let Some(file) = form.file("image") {
        location.image = state.storage.upload("locations", file).await?;
    }
    locations.put(&id, &location).await?;

    if location.image != existing.image && !existing.image.is_empty() {
        if let Err(e) = state.storage.delete(&existing.image).await {
            tracing::warn!("Could not delete previous location image {}: {}", existing.image, e);
        }
    }

    Ok(ApiResponse::ok(LocationView { location_id: id, location }).message("Location updated successfully"))
}

async fn delete_location(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let locations = state.catalog.locations();
    let location = locations.get(&id).await?.ok_or_else(|| AppError::not_found("Location"))?;
    locations.delete(&id).await?;

    if !location.image.is_empty() {
        if let Err(e) = state.storage.delete(&location.image).await {
            tracing::warn!("Could not delete location image {}: {}", location.image, e);
        }
    }
    Ok(ApiResponse::done("Location deleted successfully"))
}
