//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::store::Store;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub store: String,
}

/// Health check endpoint handler
pub async fn health_check<S: Store>(State(state): State<AppState<S>>) -> Json<HealthResponse> {
    // Check store connectivity
    let store_status = if state.store.ping().await {
        "connected".to_string()
    } else {
        "disconnected".to_string()
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        store: store_status,
    })
}
