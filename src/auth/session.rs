//! Login session endpoints: token issuance, logout, identity echo.
//!
//! There is no password step here — the upstream identity provider has
//! already authenticated the user; this server only mints its own session
//! token for the email it is handed.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::jwt;
use crate::auth::middleware::{Claims, SESSION_COOKIE};
use crate::state::AppState;

/// Session cookie lifetime in seconds (3 days, same as the token expiry).
const COOKIE_MAX_AGE_SECS: i64 = 3 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub name: Option<String>,
}

/// POST /auth/token — mint a session JWT for the given email.
/// The token is set as a cookie and echoed in the body: the WebSocket
/// handshake needs it explicitly, so it must be readable by the client.
pub async fn issue_token(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(StatusCode::BAD_REQUEST);
    }

    let token =
        jwt::issue_session_token(&state.jwt_secret, &email, body.name.clone()).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign session token");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let cookie = session_cookie(&token, COOKIE_MAX_AGE_SECS, state.secure_cookies);

    tracing::info!(email = %email, "Session token issued");

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(json!({ "success": true, "token": token })),
    ))
}

/// POST /auth/logout — clear the session cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = session_cookie("", 0, state.secure_cookies);
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(json!({ "success": true })),
    )
}

/// GET /auth/me — echo the authenticated identity back to the client.
pub async fn me(claims: Claims) -> Json<serde_json::Value> {
    Json(json!({ "user": { "email": claims.sub, "name": claims.name } }))
}

/// Build the session cookie string. SameSite=None requires Secure, so both
/// follow the secure_cookies flag together.
fn session_cookie(token: &str, max_age: i64, secure: bool) -> String {
    let attributes = if secure {
        "Path=/; SameSite=None; Secure"
    } else {
        "Path=/; SameSite=Strict"
    };
    format!(
        "{}={}; Max-Age={}; {}",
        SESSION_COOKIE, token, max_age, attributes
    )
}
