use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use serde::{Deserialize, Serialize};

/// Name of the session cookie set by POST /auth/token.
pub const SESSION_COOKIE: &str = "token";

/// JWT claims for a logged-in user.
/// Implements axum's FromRequestParts for use as an extractor on
/// conventional (non-WebSocket) routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User email — the identity string throughout the system
    pub sub: String,
    /// Display name, if the client supplied one at login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Pull the session token out of request headers: the `token` cookie first
/// (the web client's transport), then Authorization: Bearer.
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(cookies) = parts.headers.get("Cookie").and_then(|v| v.to_str().ok()) {
        for pair in cookies.split(';') {
            let pair = pair.trim();
            if let Some(value) = pair
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
            {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or(StatusCode::UNAUTHORIZED)?;

        // Get JWT secret from request extensions (set by middleware layer)
        let jwt_secret = parts
            .extensions
            .get::<JwtSecret>()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

        crate::auth::jwt::validate_token(&jwt_secret.0, &token)
            .map_err(|_| StatusCode::UNAUTHORIZED)
    }
}

/// JWT secret stored in request extensions for the Claims extractor
#[derive(Clone)]
pub struct JwtSecret(pub Vec<u8>);
