//! Token-protected v1 API endpoints

pub mod me;

use axum::{middleware::from_fn_with_state, routing::get, Router};

use super::middleware::auth_middleware;
use super::state::AppState;

/// Create v1 API router; every route requires a valid bearer token
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(me::get_me))
        .route_layer(from_fn_with_state(state, auth_middleware))
}
