//! Media download handler.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Extension;
use tokio::fs::File;
use tracing::info;

use vgrab_media::{MediaError, PreparedMedia};
use vgrab_models::{content_disposition, RetrievalParams};

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestId;
use crate::state::AppState;
use crate::stream::CleanupStream;

/// Download a video or its audio track.
///
/// Validation happens before any external process is started. The finished
/// file is streamed in a single pass and its scratch directory is removed
/// when the body completes or is dropped.
pub async fn download(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    Query(params): Query<RetrievalParams>,
) -> ApiResult<Response> {
    let request_id = request_id
        .map(|Extension(id)| id.0)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let request = params.validate(&state.host_policy)?;
    info!(
        request_id = %request_id,
        url = %request.url(),
        mode = %request.mode(),
        container = %request.container(),
        trimmed = request.trim().is_some(),
        "Download requested"
    );

    let PreparedMedia {
        path,
        size,
        content_type,
        filename,
        scratch,
        tracker,
        ..
    } = state.pipeline.retrieve(&request, &request_id).await?;

    // On error `scratch` is dropped here, removing the downloaded file.
    let file = File::open(&path).await.map_err(MediaError::from)?;
    let disposition = HeaderValue::from_str(&content_disposition(&filename))
        .map_err(|e| ApiError::internal(format!("Invalid Content-Disposition: {}", e)))?;

    let body = Body::from_stream(CleanupStream::new(
        file,
        scratch,
        tracker,
        request.mode().as_str(),
        size,
    ));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "no-store")
        .body(body)
        .map_err(|e| ApiError::internal(e.to_string()))
}
