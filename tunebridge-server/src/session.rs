//! In-memory browser sessions
//!
//! Sessions are identified by a random UUID carried in an HttpOnly cookie
//! and live only for the process lifetime. Each session owns the OAuth
//! credential and the recency log; per-session access goes through a tokio
//! mutex, which also serializes concurrent requests from the same browser
//! session.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap};
use tokio::sync::{Mutex, RwLock};
use tunebridge_core::RecentLog;
use uuid::Uuid;

use crate::token::StoredToken;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "tb_session";

/// Everything one browser session owns.
#[derive(Debug, Default)]
pub struct SessionData {
    /// OAuth credential, present once the user completed login
    pub token: Option<StoredToken>,
    /// Catalog user id captured at login
    pub user_id: Option<String>,
    /// Nonce issued with the authorize redirect, checked at callback
    pub oauth_state: Option<String>,
    /// Recency log of recommendation snapshots
    pub recent: RecentLog,
}

/// Shared handle to one session's data.
pub type SessionHandle = Arc<Mutex<SessionData>>;

/// Process-wide session registry.
///
/// Uses RwLock for concurrent lookup with rare writes (create/remove).
#[derive(Clone, Default)]
pub struct SessionLayer {
    inner: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh, empty session.
    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let handle: SessionHandle = Arc::new(Mutex::new(SessionData::default()));
        self.inner.write().await.insert(id, handle.clone());
        (id, handle)
    }

    /// Look up an existing session.
    pub async fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.inner.read().await.get(id).cloned()
    }

    /// Drop a session and everything it owns.
    pub async fn remove(&self, id: &Uuid) {
        self.inner.write().await.remove(id);
    }
}

/// Session id from the request's cookie header, when present and valid.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Uuid::parse_str(value.trim()).ok()
        } else {
            None
        }
    })
}

/// Set-Cookie value establishing a session.
///
/// Cross-site deployments need SameSite=None, which browsers only accept
/// together with Secure.
pub fn session_cookie(id: &Uuid, cross_site: bool) -> String {
    if cross_site {
        format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=None; Secure")
    } else {
        format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
    }
}

/// Set-Cookie value that expires the session cookie.
pub fn clear_session_cookie(cross_site: bool) -> String {
    if cross_site {
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=None; Secure; Max-Age=0")
    } else {
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}
