//! Profile and listening-history passthrough
//!
//! Thin forwarding to the catalog API; the only shaping is trimming the
//! profile to the fields the frontend uses and unwrapping history items
//! to bare tracks.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use tunebridge_core::catalog::CatalogApi;

use crate::api::CurrentSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// GET /api/me
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let catalog = state.catalog(&current.access_token);
    match catalog.current_user().await {
        Ok(profile) => Ok(Json(json!({
            "id": profile.id,
            "display_name": profile.display_name,
            "country": profile.country,
            "product": profile.rest.get("product").cloned().unwrap_or(Value::Null),
            "images": profile.rest.get("images").cloned().unwrap_or_else(|| json!([])),
            "external_urls": profile.rest.get("external_urls").cloned().unwrap_or_else(|| json!({})),
        }))),
        Err(err) => {
            error!(%err, "failed to fetch user profile");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed_to_fetch_user", "details": err.to_string() })),
            ))
        }
    }
}

/// GET /api/recently-played
pub async fn recently_played(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let limit = query.limit.unwrap_or(20).min(50);
    let catalog = state.catalog(&current.access_token);

    match catalog.recently_played(limit).await {
        Ok(items) => {
            let tracks: Vec<_> = items.into_iter().filter_map(|item| item.track).collect();
            Ok(Json(json!({ "items": tracks })))
        }
        Err(err) => {
            error!(%err, "failed to fetch listening history");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed_to_fetch_recently_played", "details": err.to_string() })),
            ))
        }
    }
}
