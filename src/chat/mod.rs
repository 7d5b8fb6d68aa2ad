//! Direct messaging between users: message model, persistence, relay, history.

pub mod history;
pub mod relay;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single direct message. Append-only: never updated or deleted once
/// written. `timestamp` is assigned server-side at the moment of persistence
/// and is the replay order for transcripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: String,
    pub recipient: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
