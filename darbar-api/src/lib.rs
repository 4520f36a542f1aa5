use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod games;
pub mod gold;
pub mod health;
pub mod images;
pub mod locations;
pub mod middleware;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod promos;
pub mod response;
pub mod rewards;
pub mod state;
pub mod upload;
pub mod users;

pub use state::{AppState, Services};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::USER_AGENT]);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if allowed.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(allowed)
    }
}

pub fn app(state: AppState) -> Router {
    let rules = &state.business_rules;
    let body_limit = rules.max_upload_bytes.saturating_mul(rules.max_upload_images.max(1));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .merge(catalog::routes())
        .merge(gold::routes())
        .merge(cart::routes())
        .merge(orders::routes())
        .merge(promos::routes())
        .merge(rewards::routes())
        .merge(payments::routes())
        .merge(notifications::routes())
        .merge(locations::routes())
        .merge(games::routes())
        .merge(images::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::circuit_breaker_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::session_middleware))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::rate_limit_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&state.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
