use crate::db::DbPool;
use crate::ws::ConnectionRegistry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection wrapped in Arc<Mutex>
    pub db: DbPool,
    /// JWT signing secret (256-bit random key)
    pub jwt_secret: Vec<u8>,
    /// Active WebSocket connections per user email
    pub connections: ConnectionRegistry,
    /// Whether session cookies are marked Secure with SameSite=None
    pub secure_cookies: bool,
    /// Browser origins allowed to call the API with credentials
    pub cors_origins: Vec<String>,
}
