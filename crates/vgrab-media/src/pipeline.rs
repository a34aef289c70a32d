//! Media retrieval pipeline.
//!
//! Drives one retrieval from metadata lookup to a finished file ready for
//! streaming. The file lives in a per-request [`ScratchDir`] that travels
//! with the result, so the caller decides when it is released by dropping
//! [`PreparedMedia`].

use std::path::PathBuf;
use std::sync::Arc;

use metrics::counter;
use tracing::{info, Instrument};

use vgrab_models::{attachment_filename, RetrievalRequest, SourceMetadata};

use crate::backend::MediaBackend;
use crate::error::{MediaError, MediaResult};
use crate::scratch::ScratchDir;
use crate::stage::{RetrievalStage, StageTracker};

/// Counter of finished retrievals, labelled by mode and outcome.
pub const RETRIEVALS_TOTAL: &str = "vgrab_retrievals_total";

/// Default duration ceiling in seconds.
pub const DEFAULT_MAX_DURATION_SECS: u64 = 3600;

/// A downloaded (and possibly trimmed) file ready to be streamed.
#[derive(Debug)]
pub struct PreparedMedia {
    pub path: PathBuf,
    pub size: u64,
    pub content_type: &'static str,
    pub filename: String,
    pub metadata: SourceMetadata,
    pub scratch: ScratchDir,
    pub tracker: StageTracker,
}

/// Runs retrievals against a [`MediaBackend`].
#[derive(Clone)]
pub struct RetrievalPipeline {
    backend: Arc<dyn MediaBackend>,
    temp_root: PathBuf,
    max_duration_secs: f64,
}

impl RetrievalPipeline {
    pub fn new(backend: Arc<dyn MediaBackend>, temp_root: impl Into<PathBuf>, max_duration_secs: u64) -> Self {
        Self {
            backend,
            temp_root: temp_root.into(),
            max_duration_secs: max_duration_secs as f64,
        }
    }

    pub fn backend(&self) -> &Arc<dyn MediaBackend> {
        &self.backend
    }

    pub fn max_duration_secs(&self) -> f64 {
        self.max_duration_secs
    }

    /// Fetch metadata without applying the duration ceiling.
    pub async fn metadata(&self, url: &str) -> MediaResult<SourceMetadata> {
        self.backend.fetch_metadata(url).await
    }

    /// Retrieve `request`, returning the finished file.
    ///
    /// On error every file created so far is removed before returning.
    pub async fn retrieve(&self, request: &RetrievalRequest, request_id: &str) -> MediaResult<PreparedMedia> {
        let mut tracker = StageTracker::new(request_id);
        let span = tracker.span();
        let mode = request.mode().as_str();

        match self.run(request, &mut tracker).instrument(span).await {
            Ok((path, size, metadata, scratch)) => {
                counter!(RETRIEVALS_TOTAL, "mode" => mode, "outcome" => "success").increment(1);
                tracker.advance(RetrievalStage::Streaming);
                Ok(PreparedMedia {
                    path,
                    size,
                    content_type: request.container().mime_type(),
                    filename: attachment_filename(&metadata.title, request.trim(), request.container()),
                    metadata,
                    scratch,
                    tracker,
                })
            }
            Err(e) => {
                counter!(RETRIEVALS_TOTAL, "mode" => mode, "outcome" => "failure").increment(1);
                tracker.fail(&e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &RetrievalRequest,
        tracker: &mut StageTracker,
    ) -> MediaResult<(PathBuf, u64, SourceMetadata, ScratchDir)> {
        tracker.advance(RetrievalStage::FetchingMetadata);
        let metadata = self.backend.fetch_metadata(request.url().as_str()).await?;

        let duration = metadata.duration.ok_or(MediaError::DurationUnknown)?;
        if duration > self.max_duration_secs {
            return Err(MediaError::DurationExceeded {
                duration,
                limit: self.max_duration_secs,
            });
        }
        if let Some(range) = request.trim() {
            range.check_against(duration)?;
        }

        let scratch = ScratchDir::create_async(&self.temp_root).await?;
        let stem = scratch.new_stem();

        tracker.advance(RetrievalStage::Downloading);
        let mut path = self.backend.download(request, scratch.path(), &stem).await?;

        if let Some(range) = request.trim() {
            tracker.advance(RetrievalStage::Trimming);
            let trimmed = scratch.new_file("trim", request.container().extension());
            self.backend.trim(&path, &trimmed, range).await?;
            tokio::fs::remove_file(&path).await?;
            path = trimmed;
        }

        let size = tokio::fs::metadata(&path).await?.len();
        info!(
            request_id = %tracker.request_id(),
            output = %path.display(),
            size_bytes = size,
            duration_ms = tracker.elapsed_ms(),
            "Retrieval ready"
        );

        Ok((path, size, metadata, scratch))
    }
}
