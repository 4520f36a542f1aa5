use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use darbar_offer::{GameLimit, MiniGame};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::AdminUser;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub game_id: String,
    #[serde(flatten)]
    pub game: MiniGame,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/miniGames", get(list_games).post(create_game))
        .route("/miniGames/{id}", get(get_game).put(update_game).delete(delete_game))
}

async fn create_game(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(game): Json<MiniGame>,
) -> ApiResult<GameView> {
    game.validate()?;
    GameLimit::new(state.business_rules.max_mini_games).check(state.games.count().await?)?;

    let game_id = state.games.games().insert(&game).await?;
    tracing::info!("Mini-game {} created: {}", game_id, game.name);
    Ok(ApiResponse::created(GameView { game_id, game }).message("Mini game created successfully"))
}

async fn list_games(State(state): State<AppState>) -> ApiResult<Vec<GameView>> {
    let games = state
        .games
        .games()
        .list()
        .await?
        .into_iter()
        .map(|stored| GameView {
            game_id: stored.id,
            game: stored.value,
        })
        .collect();
    Ok(ApiResponse::ok(games))
}

async fn get_game(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<GameView> {
    let game = state
        .games
        .games()
        .get(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Mini game"))?;
    Ok(ApiResponse::ok(GameView { game_id: id, game }))
}

async fn update_game(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(game): Json<MiniGame>,
) -> ApiResult<GameView> {
    game.validate()?;
    let games = state.games.games();
    if !games.exists(&id).await? {
        return Err(AppError::not_found("Mini game"));
    }
    games.put(&id, &game).await?;
    Ok(ApiResponse::ok(GameView { game_id: id, game }).message("Mini game updated successfully"))
}

async fn delete_game(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    if !state.games.games().delete(&id).await? {
        return Err(AppError::not_found("Mini game"));
    }
    Ok(ApiResponse::done("Mini game deleted successfully"))
}
