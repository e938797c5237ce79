//! Application state for shared services

use std::sync::Arc;

use crate::domain::token::TokenRepository;
use crate::infrastructure::stats::RequestCounter;
use crate::infrastructure::token::TokenService;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub token_service: Arc<TokenService>,
    pub request_counter: Arc<RequestCounter>,
}

impl AppState {
    pub fn new(token_service: Arc<TokenService>, request_counter: Arc<RequestCounter>) -> Self {
        Self {
            token_service,
            request_counter,
        }
    }

    /// State backed by the given store with a fresh request counter
    pub fn from_repository(repository: Arc<dyn TokenRepository>, window_seconds: u64) -> Self {
        Self::new(
            Arc::new(TokenService::new(repository)),
            Arc::new(RequestCounter::with_window_seconds(window_seconds)),
        )
    }
}
