//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vgrab_media::MediaError;
use vgrab_models::{RequestError, SourceUrlError};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Too many requests")]
    RateLimited,

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl From<SourceUrlError> for ApiError {
    fn from(e: SourceUrlError) -> Self {
        ApiError::Request(e.into())
    }
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Request(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Media(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Media(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgrab_models::TimestampError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(SourceUrlError::HostNotAllowed("evil.com".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::from(MediaError::DurationExceeded { duration: 4000.0, limit: 3600.0 }).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(MediaError::InvalidTrim(TimestampError::StartNotBeforeEnd)).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_tool_diagnostic_is_exposed() {
        let err = ApiError::from(MediaError::tool_failed("yt-dlp", "ERROR: Video unavailable", Some(1)));
        assert_eq!(err.to_string(), "yt-dlp failed: ERROR: Video unavailable");
    }
}
