//! Transcript endpoint on the conventional request path.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::middleware::Claims;
use crate::chat::store;
use crate::chat::ChatMessage;
use crate::state::AppState;

/// GET /messages/{recipient_email}
/// Full transcript between the caller and the given address, oldest first.
/// The caller's side of the pair comes from verified claims, so nobody can
/// read a conversation they are not part of.
pub async fn get_transcript(
    State(state): State<AppState>,
    claims: Claims,
    Path(recipient_email): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, StatusCode> {
    let recipient = recipient_email.trim().to_lowercase();

    let messages = store::transcript_between(&state.db, &claims.sub, &recipient)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Transcript query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(messages))
}
