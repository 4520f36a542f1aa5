use axum::{body::Bytes, extract::State, routing::post, Router};
use chrono::Utc;
use darbar_core::identity::NewIdentity;
use darbar_core::session::Session;
use darbar_core::user::{is_valid_email, is_valid_password, Registration, UserProfile};
use darbar_core::FieldError;
use darbar_shared::pii::redact_email;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::extract::Json;
use crate::middleware::auth::{CurrentUser, MaybeUser, TokenKind, TokenPair};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::users::UserView;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserView,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/signup", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
}

fn session_for(uid: &str, profile: &UserProfile) -> Session {
    Session {
        user_id: uid.to_string(),
        email: profile.email.expose().clone(),
        role: profile.role,
    }
}

async fn register(State(state): State<AppState>, Json(registration): Json<Registration>) -> ApiResult<AuthResponse> {
    registration.validate().map_err(AppError::InvalidFields)?;

    let identity = state
        .identity
        .create_user(&NewIdentity {
            email: registration.email.trim().to_lowercase(),
            password: registration.password.clone(),
            display_name: registration.display_name(),
        })
        .await?;

    let profile = UserProfile::new_customer(&registration, Utc::now());
    if let Err(e) = state.users.save(&identity.uid, &profile).await {
        tracing::error!("Profile write failed for {}, removing identity: {}", identity.uid, e);
        if let Err(rollback) = state.identity.delete_user(&identity.uid).await {
            tracing::error!("Identity rollback failed for {}: {}", identity.uid, rollback);
        }
        return Err(e.into());
    }

    tracing::info!("User registered: {} ({})", identity.uid, redact_email(&identity.email));
    let tokens = state.auth.issue_pair(&session_for(&identity.uid, &profile))?;
    Ok(ApiResponse::created(AuthResponse {
        user: UserView::new(identity.uid, profile),
        tokens,
    })
    .message("User registered successfully"))
}

async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> ApiResult<AuthResponse> {
    let mut errors = Vec::new();
    if !is_valid_email(request.email.trim()) {
        errors.push(FieldError::new("email", "Valid email is required"));
    }
    if request.password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }
    if !errors.is_empty() {
        return Err(AppError::InvalidFields(errors));
    }

    let identity = state.identity.sign_in(request.email.trim(), &request.password).await?;
    let now = Utc::now();

    let profile = match state.users.get(&identity.uid).await? {
        Some(mut profile) => {
            profile.last_login = Some(now);
            profile.email_verified = profile.email_verified || identity.email_verified;
            state.users.save(&identity.uid, &profile).await?;
            profile
        }
        None => {
            tracing::warn!("No profile for {}, creating one", identity.uid);
            let profile = UserProfile::from_identity(&identity.email, identity.display_name.as_deref(), now);
            state.users.save(&identity.uid, &profile).await?;
            profile
        }
    };

    tracing::info!("User logged in: {}", identity.uid);
    let tokens = state.auth.issue_pair(&session_for(&identity.uid, &profile))?;
    Ok(ApiResponse::ok(AuthResponse {
        user: UserView::new(identity.uid, profile),
        tokens,
    })
    .message("Login successful"))
}

async fn refresh_token(State(state): State<AppState>, Json(request): Json<RefreshRequest>) -> ApiResult<Value> {
    if request.refresh_token.trim().is_empty() {
        return Err(AppError::AuthenticationError("Refresh token is required".to_string()));
    }
    let claims = state.auth.verify(request.refresh_token.trim(), TokenKind::Refresh)?;

    if let Some(redis) = &state.redis {
        match redis.is_token_revoked(&claims.jti).await {
            Ok(true) => return Err(AppError::AuthenticationError("Refresh token has been revoked".to_string())),
            Ok(false) => {}
            Err(e) => tracing::warn!("Revocation check unavailable: {}", e),
        }
    }

    let profile = state
        .users
        .get(&claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let access_token = state.auth.issue(&session_for(&claims.sub, &profile), TokenKind::Access)?;
    Ok(ApiResponse::ok(json!({
        "accessToken": access_token,
        "expiresIn": state.auth.access_ttl_seconds,
    }))
    .message("Token refreshed successfully"))
}

/// The body is optional; a bare logout only ends the client's session.
async fn logout(State(state): State<AppState>, MaybeUser(session): MaybeUser, body: Bytes) -> ApiResult<Value> {
    let request: RefreshRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::ValidationError(format!("Invalid JSON body: {}", e)))?
    };
    if !request.refresh_token.trim().is_empty() {
        let claims = state.auth.verify(request.refresh_token.trim(), TokenKind::Refresh)?;
        if let Some(user) = &session {
            if user.user_id != claims.sub {
                return Err(AppError::AuthorizationError("Token belongs to another user".to_string()));
            }
        }
        match &state.redis {
            Some(redis) => redis
                .revoke_token(&claims.jti, claims.remaining_seconds())
                .await
                .map_err(|e| AppError::InternalServerError(format!("Token revocation failed: {}", e)))?,
            None => tracing::warn!("No token store configured; refresh token {} stays valid", claims.jti),
        }
    }

    Ok(ApiResponse::done("Logged out successfully"))
}

async fn change_password(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Value> {
    let mut errors = Vec::new();
    if request.current_password.is_empty() {
        errors.push(FieldError::new("currentPassword", "Current password is required"));
    }
    if !is_valid_password(&request.new_password) {
        errors.push(FieldError::new(
            "newPassword",
            "Password must be at least 8 characters with uppercase, lowercase, and number",
        ));
    }
    if !errors.is_empty() {
        return Err(AppError::InvalidFields(errors));
    }

    state
        .identity
        .change_password(&session.email, &request.current_password, &request.new_password)
        .await?;
    tracing::info!("Password changed for {}", session.user_id);
    Ok(ApiResponse::done("Password changed successfully"))
}
