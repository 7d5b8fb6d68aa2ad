//! Real-time messaging over WebSocket: handshake gate, per-connection actor,
//! JSON protocol, and the identity-keyed connection registry.

pub mod actor;
pub mod broadcast;
pub mod handler;
pub mod protocol;

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sender half of a connection's outbound channel. Cloning this is how any
/// part of the system pushes frames to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// Connection registry: every admitted connection, keyed by user email.
/// One email may hold several entries at once (multiple tabs/devices); all
/// of them receive fanout addressed to that email. Entries are removed when
/// the connection's actor exits, so membership never outlives the socket.
pub type ConnectionRegistry = Arc<DashMap<String, Vec<ConnectionSender>>>;

/// Create a new empty connection registry.
pub fn new_connection_registry() -> ConnectionRegistry {
    Arc::new(DashMap::new())
}
