//! Counts every inbound request, whatever its outcome

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::infrastructure::stats::RequestCounter;

/// Bump the process-wide request counter before handing off the request.
pub async fn request_counter_middleware(
    State(counter): State<Arc<RequestCounter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    counter.increment();
    next.run(request).await
}
