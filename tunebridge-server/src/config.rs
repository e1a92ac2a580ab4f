//! Runtime configuration
//!
//! Settings are resolved in priority order: environment variable, then an
//! optional TOML file, then the compiled default. A missing config file is
//! never fatal; the server starts with defaults and logs what it is doing.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;
use tunebridge_core::ResolverConfig;

use crate::error::{Error, Result};

/// Default OAuth scopes requested at login
const DEFAULT_SCOPE: &str =
    "user-read-email user-read-private user-read-recently-played user-top-read";

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP server binds to
    pub port: u16,
    /// Browser origins allowed to call the API with credentials
    pub frontend_origins: Vec<String>,
    /// OAuth client id issued by the streaming provider
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI registered for the authorization-code flow
    pub redirect_uri: String,
    /// OAuth scopes requested at login
    pub scope: String,
    /// Issue cross-site cookies (SameSite=None; Secure) for split-origin
    /// deployments
    pub cookie_cross_site: bool,
    /// Base URL of the catalog API
    pub catalog_base_url: String,
    /// Base URL of the account/token service
    pub auth_base_url: String,
    /// Source-resolution tunables
    pub resolver: ResolverConfig,
}

impl ServerConfig {
    /// First configured frontend origin, the one login redirects back to.
    pub fn primary_origin(&self) -> &str {
        self.frontend_origins
            .first()
            .map(String::as_str)
            .unwrap_or("http://127.0.0.1:5173")
    }
}

/// Optional TOML file shape. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub frontend_origins: Option<Vec<String>>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub cookie_cross_site: Option<bool>,
    pub catalog_base_url: Option<String>,
    pub auth_base_url: Option<String>,
    pub default_playlist: Option<String>,
    pub default_market: Option<String>,
    pub official_curator: Option<String>,
}

impl FileConfig {
    /// Load from an explicit path, or discover the platform config file.
    /// Missing files yield the empty config.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path.clone(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }
}

/// Platform config file location (`~/.config/tunebridge/config.toml` on
/// Linux).
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunebridge").join("config.toml"))
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
    env_string(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

/// Resolve the full configuration: environment > TOML file > default.
///
/// `port_arg` comes from the command line and wins over everything when
/// present.
pub fn resolve(port_arg: Option<u16>, config_path: Option<&PathBuf>) -> Result<ServerConfig> {
    let file = FileConfig::load(config_path)?;

    let port = port_arg
        .or_else(|| env_string("TUNEBRIDGE_PORT").and_then(|v| v.parse().ok()))
        .or(file.port)
        .unwrap_or(8000);

    let frontend_origins = env_string("TUNEBRIDGE_FRONTEND_ORIGIN")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect()
        })
        .or(file.frontend_origins)
        .unwrap_or_else(|| {
            vec![
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:5173".to_string(),
            ]
        });

    let client_id = env_string("TUNEBRIDGE_CLIENT_ID")
        .or(file.client_id)
        .unwrap_or_default();
    let client_secret = env_string("TUNEBRIDGE_CLIENT_SECRET")
        .or(file.client_secret)
        .unwrap_or_default();

    if client_id.is_empty() || client_secret.is_empty() {
        // Startup still succeeds so health checks work; login will fail.
        warn!("OAuth client credentials not configured; login will not work");
    }

    let config = ServerConfig {
        port,
        frontend_origins,
        client_id,
        client_secret,
        redirect_uri: env_string("TUNEBRIDGE_REDIRECT_URI")
            .or(file.redirect_uri)
            .unwrap_or_else(|| "http://127.0.0.1:8000/api/auth/callback".to_string()),
        scope: env_string("TUNEBRIDGE_SCOPE")
            .or(file.scope)
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
        cookie_cross_site: env_bool("TUNEBRIDGE_COOKIE_CROSS_SITE")
            .or(file.cookie_cross_site)
            .unwrap_or(false),
        catalog_base_url: env_string("TUNEBRIDGE_CATALOG_URL")
            .or(file.catalog_base_url)
            .unwrap_or_else(|| "https://api.spotify.com/v1".to_string()),
        auth_base_url: env_string("TUNEBRIDGE_AUTH_URL")
            .or(file.auth_base_url)
            .unwrap_or_else(|| "https://accounts.spotify.com".to_string()),
        resolver: ResolverConfig {
            default_playlist: env_string("TUNEBRIDGE_DEFAULT_PLAYLIST")
                .or(file.default_playlist)
                .unwrap_or_else(|| "37i9dQZEVXbMDoHDwVN2tF".to_string()),
            default_market: env_string("TUNEBRIDGE_DEFAULT_MARKET")
                .or(file.default_market)
                .unwrap_or_else(|| "JP".to_string()),
            official_curator: env_string("TUNEBRIDGE_CURATOR")
                .or(file.official_curator)
                .unwrap_or_else(|| "Spotify".to_string()),
        },
    };

    Ok(config)
}
