use axum::{middleware, Router};
use std::sync::Arc;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::middleware::JwtSecret;
use crate::auth::session;
use crate::chat::history;
use crate::items::{crud as item_crud, recovered};
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Inject the JWT secret into request extensions so the Claims extractor can find it.
async fn inject_jwt_secret(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    req.extensions_mut()
        .insert(JwtSecret(state.jwt_secret.clone()));
    next.run(req).await
}

/// Build the CORS layer from the configured origin allowlist.
/// Credentials are allowed (the session travels in a cookie), which rules
/// out a wildcard origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Rate limiting on token issuance: 5 requests per minute per IP.
    // Uses PeerIpKeyExtractor which reads from ConnectInfo<SocketAddr>.
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(12) // 1 token every 12 seconds = 5 per minute
            .burst_size(5) // Allow burst of 5
            .finish()
            .expect("Failed to build governor config"),
    );
    let governor_limiter = governor_config.limiter().clone();

    // Spawn background task to clean up rate limiter state
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    // Token issuance with rate limiting — the one brute-forceable endpoint
    let token_routes = Router::new()
        .route("/auth/token", axum::routing::post(session::issue_token))
        .layer(GovernorLayer {
            config: governor_config,
        });

    let session_routes = Router::new()
        .route("/auth/logout", axum::routing::post(session::logout))
        .route("/auth/me", axum::routing::get(session::me));

    // Listings are browseable without a login; the detail view and all
    // writes require one (the Claims extractor validates the token).
    let item_routes = Router::new()
        .route("/items", axum::routing::get(item_crud::list_items))
        .route("/items", axum::routing::post(item_crud::create_item))
        .route("/items/{id}", axum::routing::get(item_crud::get_item))
        .route("/items/{id}", axum::routing::put(item_crud::update_item))
        .route("/items/{id}", axum::routing::delete(item_crud::delete_item))
        .route(
            "/my-items/{email}",
            axum::routing::get(item_crud::list_my_items),
        );

    let recovered_routes = Router::new()
        .route("/recovered", axum::routing::post(recovered::report_recovered))
        .route(
            "/recovered/{email}",
            axum::routing::get(recovered::list_recovered),
        );

    // Transcript endpoint — conventional auth, same data model as the relay
    let message_routes = Router::new().route(
        "/messages/{recipient_email}",
        axum::routing::get(history::get_transcript),
    );

    // WebSocket endpoint (auth via query param, not cookie)
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    // Health check
    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(token_routes)
        .merge(session_routes)
        .merge(item_routes)
        .merge(recovered_routes)
        .merge(message_routes)
        .merge(ws_routes)
        .merge(health)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            inject_jwt_secret,
        ))
        .layer(cors_layer(&state.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
