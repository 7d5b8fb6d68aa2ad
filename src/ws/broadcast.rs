//! Fanout helpers for the connection registry.

use axum::extract::ws::Message;

use crate::ws::protocol::ServerEvent;
use crate::ws::ConnectionRegistry;

/// Deliver an event to every admitted connection of one user.
/// Best-effort: a user with no registry entry is simply offline, and a send
/// into a closed channel means that connection is already tearing down.
/// Neither case is an error.
pub fn send_to_user(registry: &ConnectionRegistry, email: &str, event: &ServerEvent) {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize broadcast event");
            return;
        }
    };
    let msg = Message::Text(json.into());

    if let Some(connections) = registry.get(email) {
        for sender in connections.value().iter() {
            let _ = sender.send(msg.clone());
        }
    }
}
