//! Request statistics endpoint

use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::types::Json;

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_requests: u64,
    /// Smoothed requests per second
    pub current_rate: f64,
}

/// GET /admin/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.request_counter.stats();

    Json(StatsResponse {
        total_requests: stats.total,
        current_rate: stats.current_rate,
    })
}
