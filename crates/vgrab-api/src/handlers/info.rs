//! Metadata lookup handler.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use vgrab_models::SourceMetadata;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InfoQuery {
    pub url: Option<String>,
}

/// Fetch metadata for a video URL.
///
/// The duration ceiling does not apply here; clients use this to decide
/// whether a download will be accepted.
pub async fn get_info(
    State(state): State<AppState>,
    Query(query): Query<InfoQuery>,
) -> ApiResult<Json<SourceMetadata>> {
    let url = state.host_policy.validate(query.url.as_deref())?;

    let metadata = state.pipeline.metadata(url.as_str()).await?;
    info!(
        id = %metadata.id,
        duration = ?metadata.duration,
        within_limit = metadata.within_duration(state.pipeline.max_duration_secs()),
        "Metadata served"
    );

    Ok(Json(metadata))
}
