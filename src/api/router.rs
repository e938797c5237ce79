use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

use super::admin;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware, request_counter_middleware};
use super::state::AppState;
use super::types::ApiError;
use super::v1;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    build_router(state, None)
}

/// Create the full router plus the Prometheus scrape endpoint at `path`
pub fn create_router_with_metrics(
    state: AppState,
    path: &str,
    metrics: PrometheusMetrics,
) -> Router {
    build_router(state, Some(create_metrics_router(path, metrics)))
}

fn build_router(state: AppState, metrics_router: Option<Router>) -> Router {
    let counter = state.request_counter.clone();

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router(state.clone()))
        .nest("/admin", admin::create_admin_router())
        .fallback(not_found)
        .with_state(state);

    if let Some(metrics_router) = metrics_router {
        router = router.merge(metrics_router);
    }

    // The counter is the outermost layer so rejected requests are counted too
    router
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(logging_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(from_fn_with_state(counter, request_counter_middleware))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
