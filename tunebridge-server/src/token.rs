//! OAuth token lifecycle
//!
//! Authorization-code exchange and refresh against the account service's
//! token endpoint. Credentials live in the session; this module hands out
//! a valid access token, refreshing shortly before expiry the way the
//! account service expects.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::session::SessionHandle;

/// Refresh when the credential expires within this many seconds.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Token provider errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// The session holds no credential (or none that can be refreshed)
    #[error("no credential available")]
    NoCredential,

    /// Transport failure talking to the token endpoint
    #[error("HTTP error: {0}")]
    Http(String),

    /// Token endpoint rejected the request
    #[error("token endpoint error {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    /// Authorize URL could not be built from the configuration
    #[error("invalid authorize URL: {0}")]
    InvalidUrl(String),
}

/// An OAuth credential as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    /// Absent when the provider chose not to rotate it
    pub refresh_token: Option<String>,
    /// Seconds since epoch when `access_token` expires
    pub expires_at: i64,
    pub scope: Option<String>,
}

/// Wire shape of the token endpoint's response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
    #[serde(default)]
    scope: Option<String>,
}

/// Broker for the authorization-code flow and token refresh.
pub struct TokenProvider {
    http: reqwest::Client,
    auth_base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: String,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, config: &ServerConfig) -> Self {
        Self {
            http,
            auth_base_url: config.auth_base_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
        }
    }

    /// Authorization URL the browser is redirected to at login.
    ///
    /// `show_dialog` forces the account chooser so switching accounts
    /// works without clearing provider cookies.
    pub fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/authorize", self.auth_base_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", self.scope.as_str()),
                ("state", state),
                ("show_dialog", "true"),
            ],
        )
        .map_err(|e| AuthError::InvalidUrl(e.to_string()))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for a credential.
    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken, AuthError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    /// Refresh a credential. A refresh response without a new refresh
    /// token keeps the old one.
    pub async fn refresh(&self, token: &StoredToken) -> Result<StoredToken, AuthError> {
        let refresh_token = token.refresh_token.as_deref().ok_or(AuthError::NoCredential)?;

        let mut fresh = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        if fresh.refresh_token.is_none() {
            fresh.refresh_token = token.refresh_token.clone();
        }
        Ok(fresh)
    }

    /// A valid access token for the session, refreshing when the stored
    /// credential is about to expire.
    ///
    /// Returns `None` when the session has no credential or the refresh
    /// fails; a failed refresh also clears the stored credential so the
    /// client sees a consistent logged-out state.
    pub async fn access_token(&self, session: &SessionHandle) -> Option<String> {
        let mut data = session.lock().await;
        let token = data.token.as_ref()?;

        if token.expires_at - now_ts() >= REFRESH_MARGIN_SECS {
            return Some(token.access_token.clone());
        }

        match self.refresh(token).await {
            Ok(fresh) => {
                info!("access token refreshed");
                let access = fresh.access_token.clone();
                data.token = Some(fresh);
                Some(access)
            }
            Err(err) => {
                warn!(%err, "token refresh failed, clearing session credential");
                data.token = None;
                data.user_id = None;
                None
            }
        }
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<StoredToken, AuthError> {
        let url = format!("{}/api/token", self.auth_base_url);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;

        Ok(StoredToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: now_ts() + token.expires_in,
            scope: token.scope,
        })
    }
}

/// Current wall-clock time in seconds since epoch.
pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
