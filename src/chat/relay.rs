//! The message relay: turns a sendMessage event from an admitted connection
//! into a persisted row plus fanout to both parties' channels.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::chat::store::{self, StoreError};
use crate::chat::ChatMessage;
use crate::state::AppState;
use crate::ws::broadcast;
use crate::ws::protocol::ServerEvent;

/// Maximum message payload length (chars).
const MAX_MESSAGE_LENGTH: usize = 4000;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("message too long")]
    MessageTooLong,
    #[error("recipient is not a valid address")]
    InvalidRecipient,
    #[error("failed to store message")]
    Persistence(#[from] StoreError),
}

/// Persist a message from `sender`, then deliver it.
///
/// The sender identity always comes from the connection's verified claims,
/// never from the client payload. Delivery happens strictly after the insert
/// resolves: a message seen on a live channel is always retrievable from the
/// transcript. An offline recipient is not an error — the row is picked up
/// by the history endpoint on their next load.
pub async fn relay_message(
    state: &AppState,
    sender: &str,
    recipient: &str,
    body: &str,
) -> Result<ChatMessage, RelayError> {
    let recipient = recipient.trim().to_lowercase();
    if recipient.is_empty() || !recipient.contains('@') {
        return Err(RelayError::InvalidRecipient);
    }
    if body.trim().is_empty() {
        return Err(RelayError::EmptyMessage);
    }
    if body.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(RelayError::MessageTooLong);
    }

    let msg = ChatMessage {
        id: Uuid::now_v7().to_string(),
        sender: sender.to_string(),
        recipient,
        message: body.to_string(),
        timestamp: Utc::now(),
    };

    store::insert_message(&state.db, &msg).await?;

    // Persisted — now fan out to every connection in the recipient's channel,
    // and to the sender's own channel so their other tabs see it too.
    let event = ServerEvent::ReceiveMessage(msg.clone());
    broadcast::send_to_user(&state.connections, &msg.recipient, &event);
    broadcast::send_to_user(&state.connections, &msg.sender, &event);

    tracing::debug!(
        sender = %msg.sender,
        recipient = %msg.recipient,
        id = %msg.id,
        "Message relayed"
    );

    Ok(msg)
}
