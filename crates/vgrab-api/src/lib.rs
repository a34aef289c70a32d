//! Axum HTTP API server.
//!
//! This crate provides:
//! - Metadata lookup and media download endpoints
//! - Streaming responses with per-request temp cleanup
//! - Optional per-IP rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod stream;

pub use config::{ApiConfig, LogFormat};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
