use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{Duration, Utc};
use darbar_core::session::{Role, Session};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

use crate::{error::AppError, state::{AppState, AuthConfig}};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub typ: TokenKind,
    pub jti: String,
    pub exp: usize,
}

impl Claims {
    pub fn session(&self) -> Session {
        Session {
            user_id: self.sub.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    /// Seconds until expiry, never negative.
    pub fn remaining_seconds(&self) -> u64 {
        (self.exp as i64 - Utc::now().timestamp()).max(0) as u64
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

impl AuthConfig {
    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    pub fn issue(&self, session: &Session, kind: TokenKind) -> Result<String, AppError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_seconds,
            TokenKind::Refresh => self.refresh_ttl_seconds,
        };
        let claims = Claims {
            sub: session.user_id.clone(),
            email: session.email.clone(),
            role: session.role,
            typ: kind,
            jti: Uuid::new_v4().to_string(),
            exp: (Utc::now() + Duration::seconds(ttl as i64)).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret(kind)))
            .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
    }

    pub fn issue_pair(&self, session: &Session) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue(session, TokenKind::Access)?,
            refresh_token: self.issue(session, TokenKind::Refresh)?,
            expires_in: self.access_ttl_seconds,
        })
    }

    /// Decode and check signature, expiry and token kind.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(kind)),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            tracing::debug!("Rejected {:?} token: {}", kind, e);
            AppError::AuthenticationError("Invalid or expired token".to_string())
        })?;

        if data.claims.typ != kind {
            return Err(AppError::AuthenticationError("Invalid token type".to_string()));
        }
        Ok(data.claims)
    }
}

// ============================================================================
// Session Middleware
// ============================================================================

/// Attach a `Session` to requests carrying a valid bearer access token.
/// Requests without a token pass through anonymously; a bad token is rejected.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => {
            let claims = state.auth.verify(bearer.token(), TokenKind::Access)?;
            req.extensions_mut().insert(claims.session());
        }
        None if req.headers().contains_key(AUTHORIZATION) => {
            return Err(AppError::AuthenticationError("Bearer token required".to_string()));
        }
        None => {}
    }

    Ok(next.run(req).await)
}

// ============================================================================
// Extractors
// ============================================================================

/// Any authenticated caller.
pub struct CurrentUser(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::AuthenticationError("Access token required".to_string()))
    }
}

/// An authenticated caller with the admin role.
pub struct AdminUser(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(session) = CurrentUser::from_request_parts(parts, state).await?;
        if !session.is_admin() {
            return Err(AppError::AuthorizationError("Admin access required".to_string()));
        }
        Ok(AdminUser(session))
    }
}

/// The caller's session when one was presented.
pub struct MaybeUser(pub Option<Session>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Session>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            access_secret: "access".to_string(),
            refresh_secret: "refresh".to_string(),
            access_ttl_seconds: 60,
            refresh_ttl_seconds: 120,
        }
    }

    fn session() -> Session {
        Session {
            user_id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let auth = config();
        let pair = auth.issue_pair(&session()).unwrap();

        let claims = auth.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.session(), session());
        assert!(claims.remaining_seconds() <= 60);

        let refresh = auth.verify(&pair.refresh_token, TokenKind::Refresh).unwrap();
        assert_eq!(refresh.typ, TokenKind::Refresh);
        assert_ne!(refresh.jti, claims.jti);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let auth = config();
        let pair = auth.issue_pair(&session()).unwrap();
        assert!(auth.verify(&pair.refresh_token, TokenKind::Access).is_err());
        assert!(auth.verify(&pair.access_token, TokenKind::Refresh).is_err());
        assert!(auth.verify("not-a-jwt", TokenKind::Access).is_err());
    }
}
