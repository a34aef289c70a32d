//! Application state.

use std::sync::Arc;

use vgrab_media::{CliBackend, MediaBackend, RetrievalPipeline};
use vgrab_models::HostPolicy;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub host_policy: Arc<HostPolicy>,
    pub pipeline: RetrievalPipeline,
}

impl AppState {
    /// Create state backed by the configured yt-dlp and FFmpeg executables.
    pub fn new(config: ApiConfig) -> Self {
        let backend = CliBackend::new(
            config.ytdlp_path.clone(),
            config.ffmpeg_path.clone(),
            config.tool_timeouts(),
        );
        Self::with_backend(config, Arc::new(backend))
    }

    /// Create state over an arbitrary media backend.
    pub fn with_backend(config: ApiConfig, backend: Arc<dyn MediaBackend>) -> Self {
        let pipeline = RetrievalPipeline::new(backend, config.temp_dir.clone(), config.max_duration_secs);
        Self {
            host_policy: Arc::new(config.host_policy()),
            config: Arc::new(config),
            pipeline,
        }
    }
}
