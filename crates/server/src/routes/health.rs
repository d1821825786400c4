//! Health check endpoint.
//!
//! - `GET /health` - Liveness probe (always 200 if server is up)

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::ServerState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: &'static str,
    /// Number of tickers with a loaded model.
    pub models: usize,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Liveness probe: `GET /health`
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        models: state.registry().len(),
        uptime_secs: state.uptime_secs(),
    })
}
