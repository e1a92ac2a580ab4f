//! Login flow and session authentication
//!
//! The authorization-code handshake with the account service, plus the
//! middleware that gates every API endpoint behind a session holding a
//! valid credential.

use axum::{
    extract::{Query, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use tunebridge_core::catalog::CatalogApi;
use uuid::Uuid;

use crate::session::{
    clear_session_cookie, session_cookie, session_id_from_headers, SessionHandle,
};
use crate::AppState;

/// Session context attached to authenticated requests.
#[derive(Clone)]
pub struct CurrentSession {
    pub session: SessionHandle,
    pub access_token: String,
}

/// Authentication middleware
///
/// Resolves the session from the request cookie and obtains a valid
/// access token (refreshing if needed). Returns 401 when either is
/// missing; handlers behind this middleware can rely on [`CurrentSession`]
/// being present.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiAuthError> {
    let session = match session_id_from_headers(request.headers()) {
        Some(id) => state.sessions.get(&id).await,
        None => None,
    }
    .ok_or(ApiAuthError::Unauthorized)?;

    let access_token = state
        .tokens
        .access_token(&session)
        .await
        .ok_or(ApiAuthError::Unauthorized)?;

    request.extensions_mut().insert(CurrentSession {
        session,
        access_token,
    });

    Ok(next.run(request).await)
}

/// Authentication error for HTTP responses
#[derive(Debug)]
pub enum ApiAuthError {
    Unauthorized,
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        match self {
            ApiAuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response(),
        }
    }
}

/// GET /api/auth/login
///
/// Starts a fresh session (dropping any existing one so account switching
/// works) and redirects the browser to the account service's authorize
/// page.
pub async fn login(State(state): State<AppState>, request: Request) -> Response {
    if let Some(old) = session_id_from_headers(request.headers()) {
        state.sessions.remove(&old).await;
    }

    let (id, session) = state.sessions.create().await;
    let nonce = Uuid::new_v4().to_string();
    session.lock().await.oauth_state = Some(nonce.clone());

    let url = match state.tokens.authorize_url(&nonce) {
        Ok(url) => url,
        Err(err) => {
            warn!(%err, "could not build authorize URL");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "auth_not_configured" })),
            )
                .into_response();
        }
    };

    info!("redirecting to account service for authorization");
    (
        [(
            header::SET_COOKIE,
            session_cookie(&id, state.config.cookie_cross_site),
        )],
        Redirect::to(&url),
    )
        .into_response()
}

/// Query parameters of the authorize redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /api/auth/callback
///
/// Completes the code exchange, pins the catalog user id to the session,
/// and sends the browser back to the frontend.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    request: Request,
) -> Response {
    if let Some(error) = query.error {
        return (
            StatusCode::BAD_REQUEST,
            format!("authorization failed: {error}"),
        )
            .into_response();
    }

    let session = match session_id_from_headers(request.headers()) {
        Some(id) => state.sessions.get(&id).await,
        None => None,
    };
    let Some(session) = session else {
        return (StatusCode::BAD_REQUEST, "no login in progress").into_response();
    };

    // The nonce issued at login must come back unchanged.
    let expected = session.lock().await.oauth_state.take();
    if expected.is_some() && expected != query.state {
        warn!("authorize state mismatch, rejecting callback");
        return (StatusCode::BAD_REQUEST, "state mismatch").into_response();
    }

    let Some(code) = query.code else {
        return (StatusCode::BAD_REQUEST, "missing authorization code").into_response();
    };

    let token = match state.tokens.exchange_code(&code).await {
        Ok(token) => token,
        Err(err) => {
            warn!(%err, "code exchange failed");
            return (StatusCode::BAD_GATEWAY, "code exchange failed").into_response();
        }
    };

    // Pin the user id while we hold a fresh token. Best-effort: login
    // still succeeds when the profile endpoint is unavailable.
    let user_id = match state.catalog(&token.access_token).current_user().await {
        Ok(profile) => {
            info!(user = profile.id.as_deref().unwrap_or("?"), "logged in");
            profile.id
        }
        Err(err) => {
            warn!(%err, "could not fetch profile after login");
            None
        }
    };

    {
        let mut data = session.lock().await;
        data.token = Some(token);
        data.user_id = user_id;
    }

    Redirect::to(&format!("{}/", state.config.primary_origin())).into_response()
}

/// POST /api/auth/logout
///
/// Drops the session and expires its cookie.
pub async fn logout(State(state): State<AppState>, request: Request) -> Response {
    if let Some(id) = session_id_from_headers(request.headers()) {
        state.sessions.remove(&id).await;
    }

    (
        [(
            header::SET_COOKIE,
            clear_session_cookie(state.config.cookie_cross_site),
        )],
        Json(json!({ "ok": true })),
    )
        .into_response()
}
