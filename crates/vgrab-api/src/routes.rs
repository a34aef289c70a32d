//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use crate::handlers::{download, get_info, health, index, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimiterCache};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let mut api_routes = Router::new()
        .route("/info", get(get_info))
        .route("/download", get(download));

    if let Some(limiter) = RateLimiterCache::new(state.config.rate_limit_rps, state.config.rate_limit_burst) {
        info!(
            rps = state.config.rate_limit_rps,
            burst = state.config.rate_limit_burst,
            "Per-IP rate limiting enabled"
        );
        api_routes = api_routes.layer(middleware::from_fn_with_state(Arc::new(limiter), rate_limit_middleware));
    }

    let health_routes = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors)
        .with_state(state)
}
