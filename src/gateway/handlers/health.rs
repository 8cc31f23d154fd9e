//! Health check handler

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{Json, extract::State};

use super::super::state::AppState;

/// Health check response data
#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Server timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Accounts currently holding a lock entry
    pub live_lock_entries: usize,
    /// Tolerated unlock-without-lock events since start-up
    pub release_anomalies: u64,
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    Json(HealthResponse {
        status: "UP",
        timestamp_ms,
        live_lock_entries: state.coordinator.live_entries(),
        release_anomalies: state.coordinator.release_anomalies(),
    })
}
