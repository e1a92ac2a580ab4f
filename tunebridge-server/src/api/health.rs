//! Liveness endpoints

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::token::now_ts;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /api/ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "ok": true, "ts": now_ts() }))
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "tunebridge-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
