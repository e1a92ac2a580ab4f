//! Recommendation endpoints
//!
//! Front door of the source-resolution pipeline and the per-session
//! recency log. Resolution failures never surface here: an empty track
//! list is a safe state for the frontend, a 500 is not.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use tunebridge_core::catalog::{PlaylistCandidate, Track};
use tunebridge_core::pipeline::{self, AnnotatedEntry};
use tunebridge_core::{RecentLogError, SourceResolver};

use crate::api::CurrentSession;
use crate::token::now_ts;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TracksResponse {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub entries: Vec<AnnotatedEntry>,
}

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub entries: Vec<PlaylistCandidate>,
    pub market: Option<String>,
}

/// GET /api/recommendations
///
/// Holding the session lock across resolution serializes concurrent
/// requests from the same browser session, which is all the ordering the
/// recency log needs.
pub async fn recommendations(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Json<TracksResponse> {
    let catalog = state.catalog(&current.access_token);

    let mut session = current.session.lock().await;
    let tracks = pipeline::recommend(
        &catalog,
        &state.config.resolver,
        &mut session.recent,
        now_ts(),
    )
    .await;
    drop(session);

    info!(count = tracks.len(), "served recommendations");
    Json(TracksResponse { tracks })
}

/// GET /api/recommendations/recent
pub async fn recent(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Json<RecentResponse> {
    let catalog = state.catalog(&current.access_token);

    let session = current.session.lock().await;
    let entries = pipeline::recent_with_tracks(&catalog, &session.recent).await;

    Json(RecentResponse { entries })
}

/// DELETE /api/recommendations/recent
pub async fn clear_recent(Extension(current): Extension<CurrentSession>) -> Json<Value> {
    current.session.lock().await.recent.clear();
    Json(json!({ "ok": true }))
}

/// DELETE /api/recommendations/recent/{index}
///
/// The one endpoint with a precise client-facing error: an out-of-range
/// index means the client's view of the log is stale, and the reported
/// size lets it reconcile and retry.
pub async fn delete_recent_at(
    Extension(current): Extension<CurrentSession>,
    Path(index): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut session = current.session.lock().await;
    match session.recent.delete_at(index) {
        Ok((removed_ts, size)) => Ok(Json(json!({
            "ok": true,
            "removed_ts": removed_ts,
            "size": size,
        }))),
        Err(RecentLogError::IndexOutOfRange { len, .. }) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "error": "index_out_of_range",
                "size": len,
            })),
        )),
    }
}

/// DELETE /api/recommendations/recent/by-ts/{ts}
pub async fn delete_recent_by_ts(
    Extension(current): Extension<CurrentSession>,
    Path(ts): Path<i64>,
) -> Json<Value> {
    let mut session = current.session.lock().await;
    let (removed, size) = session.recent.delete_by_ts(ts);
    Json(json!({ "ok": true, "removed": removed, "size": size }))
}

/// GET /api/recommendations/sources
///
/// Candidate playlists the resolver would consider, without probing them.
pub async fn sources(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Json<SourcesResponse> {
    let catalog = state.catalog(&current.access_token);
    let (entries, market) = SourceResolver::new(&catalog, &state.config.resolver)
        .list_sources()
        .await;

    Json(SourcesResponse { entries, market })
}
