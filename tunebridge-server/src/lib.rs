//! tunebridge-server library - session-authenticated catalog proxy
//!
//! Brokers a browser frontend's access to the streaming provider's API:
//! OAuth login and token refresh, passthrough profile/history endpoints,
//! and the recommendation pipeline with its per-session recency log.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod session;
pub mod token;

pub use config::ServerConfig;
pub use error::{Error, Result};

use catalog::HttpCatalog;
use session::SessionLayer;
use token::TokenProvider;

/// Timeout for every outbound call to the catalog and account services.
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub sessions: SessionLayer,
    pub tokens: Arc<TokenProvider>,
    http: reqwest::Client,
}

impl AppState {
    /// Create new application state with a shared outbound HTTP client.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(OUTBOUND_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        let tokens = Arc::new(TokenProvider::new(http.clone(), &config));

        Ok(Self {
            config: Arc::new(config),
            sessions: SessionLayer::new(),
            tokens,
            http,
        })
    }

    /// Catalog client authenticated with one session's access token.
    pub fn catalog(&self, access_token: &str) -> HttpCatalog {
        HttpCatalog::new(
            self.http.clone(),
            self.config.catalog_base_url.clone(),
            access_token,
        )
    }
}

/// Build application router
///
/// Protected routes require a session with a valid credential; everything
/// else (health, auth handshake) is public.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/me", get(api::profile::me))
        .route("/api/recently-played", get(api::profile::recently_played))
        .route("/api/recommendations", get(api::recommendations::recommendations))
        .route(
            "/api/recommendations/recent",
            get(api::recommendations::recent).delete(api::recommendations::clear_recent),
        )
        .route(
            "/api/recommendations/recent/by-ts/:ts",
            delete(api::recommendations::delete_recent_by_ts),
        )
        .route(
            "/api/recommendations/recent/:index",
            delete(api::recommendations::delete_recent_at),
        )
        .route("/api/recommendations/sources", get(api::recommendations::sources))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_session,
        ));

    let public = Router::new()
        .route("/api/ping", get(api::health::ping))
        .route("/api/health", get(api::health::health))
        .route("/api/auth/login", get(api::auth::login))
        .route("/api/auth/callback", get(api::auth::callback))
        .route("/api/auth/logout", post(api::auth::logout));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS restricted to the configured frontend origins, with credentials
/// so the session cookie travels on cross-origin requests.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparsable frontend origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true)
}
