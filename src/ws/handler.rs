use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use serde::Deserialize;

use crate::auth::jwt;
use crate::state::AppState;
use crate::ws::actor;

/// Query parameters for the WebSocket handshake. The token travels in the
/// URL rather than a cookie: the handshake is the one place the client must
/// present credentials explicitly.
#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

/// Close code for a failed handshake. Missing, malformed, and expired tokens
/// all share it — the client learns only that authentication failed.
const CLOSE_UNAUTHORIZED: u16 = 4001;

enum TokenRejection {
    Missing,
    Invalid(jsonwebtoken::errors::Error),
}

/// GET /ws?token=JWT
/// WebSocket upgrade endpoint. The gate runs before any registry join: a
/// connection that fails verification is upgraded, closed immediately, and
/// never acquires an identity.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let verified = params
        .token
        .as_deref()
        .ok_or(TokenRejection::Missing)
        .and_then(|token| {
            jwt::validate_token(&state.jwt_secret, token).map_err(TokenRejection::Invalid)
        });

    match verified {
        Ok(claims) => {
            tracing::info!(email = %claims.sub, "WebSocket connection authenticated");
            ws.on_upgrade(move |socket| actor::run_connection(socket, state, claims.sub))
        }
        Err(rejection) => {
            match &rejection {
                TokenRejection::Missing => {
                    tracing::warn!("WebSocket handshake without token");
                }
                TokenRejection::Invalid(err) => {
                    tracing::warn!(error = %err, "WebSocket handshake with bad token");
                }
            }
            ws.on_upgrade(reject)
        }
    }
}

/// Upgrade, send a Close frame with the auth close code, and drop the socket.
async fn reject(mut socket: WebSocket) {
    let close_frame = CloseFrame {
        code: CLOSE_UNAUTHORIZED,
        reason: "Authentication error".into(),
    };
    let _ = socket.send(Message::Close(Some(close_frame))).await;
}
