//! Admin API endpoints

pub mod stats;
pub mod tokens;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/tokens", post(tokens::create_token).get(tokens::list_tokens))
        .route(
            "/tokens/{token_id}",
            get(tokens::get_token)
                .patch(tokens::update_token)
                .delete(tokens::delete_token),
        )
        .route("/stats", get(stats::get_stats))
}
