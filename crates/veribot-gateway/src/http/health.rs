use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET /health — liveness probe.
pub async fn health_handler(State(_state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
