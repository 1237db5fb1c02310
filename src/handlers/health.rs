// src/handlers/health.rs

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::state::AppState;

/// Liveness plus a store round-trip. Always 200; a failing store shows up in the body.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up, with store status")),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let store_status = match state.store.health_check().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            "unavailable"
        }
    };

    Json(json!({
        "status": "ok",
        "store": state.store.backend(),
        "store_status": store_status,
    }))
}
