//! JSON wire protocol for the real-time channel, and event dispatch.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::chat::relay::{self, RelayError};
use crate::chat::ChatMessage;
use crate::state::AppState;

/// Client → server events.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Send a direct message to another user.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        recipient_email: String,
        message: String,
    },
}

/// Server → client events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// A message addressed to (or sent by) this connection's identity.
    ReceiveMessage(ChatMessage),
    /// A sendMessage event was accepted but could not be completed. The
    /// message was NOT stored and will not appear in the transcript.
    #[serde(rename_all = "camelCase")]
    SendFailed { reason: String },
    /// The client sent something the server could not understand.
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

/// Handle one inbound text frame from an admitted connection.
/// Each frame is one unit of work: decode, dispatch, and report the outcome
/// on this connection's own channel.
pub async fn handle_text_message(
    text: &str,
    tx: &mpsc::UnboundedSender<Message>,
    state: &AppState,
    email: &str,
) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(email = %email, error = %e, "Failed to decode client event");
            send_event(
                tx,
                &ServerEvent::Error {
                    message: format!("invalid event: {}", e),
                },
            );
            return;
        }
    };

    match event {
        ClientEvent::SendMessage {
            recipient_email,
            message,
        } => {
            match relay::relay_message(state, email, &recipient_email, &message).await {
                Ok(_) => {
                    // Success is implicit: the sender's own channel receives
                    // the receiveMessage echo as part of fanout.
                }
                Err(err) => {
                    if let RelayError::Persistence(e) = &err {
                        tracing::error!(email = %email, error = %e, "Failed to persist message");
                    }
                    send_event(
                        tx,
                        &ServerEvent::SendFailed {
                            reason: err.to_string(),
                        },
                    );
                }
            }
        }
    }
}

/// Serialize an event and queue it on a connection's outbound channel.
pub fn send_event(tx: &mpsc::UnboundedSender<Message>, event: &ServerEvent) {
    match serde_json::to_string(event) {
        Ok(json) => {
            let _ = tx.send(Message::Text(json.into()));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize server event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decodes_send_message_event() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"sendMessage","recipientEmail":"bob@x.com","message":"found your wallet"}"#,
        )
        .unwrap();

        match event {
            ClientEvent::SendMessage {
                recipient_email,
                message,
            } => {
                assert_eq!(recipient_email, "bob@x.com");
                assert_eq!(message, "found your wallet");
            }
        }
    }

    #[test]
    fn receive_message_carries_type_tag_and_fields() {
        let msg = ChatMessage {
            id: "0192aa00-0000-7000-8000-000000000000".to_string(),
            sender: "alice@x.com".to_string(),
            recipient: "bob@x.com".to_string(),
            message: "hi".to_string(),
            timestamp: chrono::Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        };

        let json = serde_json::to_value(ServerEvent::ReceiveMessage(msg)).unwrap();
        assert_eq!(json["type"], "receiveMessage");
        assert_eq!(json["sender"], "alice@x.com");
        assert_eq!(json["recipient"], "bob@x.com");
        assert_eq!(json["message"], "hi");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn send_failure_is_an_explicit_event() {
        let json = serde_json::to_value(ServerEvent::SendFailed {
            reason: "failed to store message".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "sendFailed");
        assert_eq!(json["reason"], "failed to store message");
    }
}
