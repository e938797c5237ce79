//! API middleware components

pub mod auth;
pub mod logging;
pub mod metrics;
pub mod request_counter;

pub use auth::{auth_middleware, extract_bearer_token, AuthError, AuthenticatedToken};
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use request_counter::request_counter_middleware;
