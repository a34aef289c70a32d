//! Media backend seam.
//!
//! [`MediaBackend`] is everything the pipeline needs from the outside world.
//! [`CliBackend`] implements it over the yt-dlp and FFmpeg executables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use vgrab_models::{RetrievalRequest, SourceMetadata, TrimRange};

use crate::command::{Tool, ToolRunner};
use crate::error::MediaResult;
use crate::{ffmpeg, ytdlp};

/// Availability of one external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// External media operations used by the retrieval pipeline.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Fetch metadata for a validated URL.
    async fn fetch_metadata(&self, url: &str) -> MediaResult<SourceMetadata>;

    /// Download `request` into `dir`, returning the produced file.
    async fn download(&self, request: &RetrievalRequest, dir: &Path, stem: &str) -> MediaResult<PathBuf>;

    /// Stream-copy `range` of `input` into `output`.
    async fn trim(&self, input: &Path, output: &Path, range: &TrimRange) -> MediaResult<()>;

    /// Report whether the external tools can be found.
    fn tool_status(&self) -> Vec<ToolStatus>;
}

/// Per-tool timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolTimeouts {
    pub metadata: Duration,
    pub download: Duration,
    pub trim: Duration,
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self {
            metadata: Duration::from_secs(60),
            download: Duration::from_secs(1800),
            trim: Duration::from_secs(600),
        }
    }
}

/// Production backend running yt-dlp and FFmpeg as child processes.
#[derive(Debug, Clone)]
pub struct CliBackend {
    yt_dlp: Tool,
    ffmpeg: Tool,
    timeouts: ToolTimeouts,
}

impl CliBackend {
    pub fn new(yt_dlp: impl Into<String>, ffmpeg: impl Into<String>, timeouts: ToolTimeouts) -> Self {
        Self {
            yt_dlp: Tool::yt_dlp(yt_dlp),
            ffmpeg: Tool::ffmpeg(ffmpeg),
            timeouts,
        }
    }

    fn runner(&self, tool: &Tool, timeout: Duration) -> ToolRunner {
        ToolRunner::new(tool.clone()).with_timeout(timeout)
    }
}

#[async_trait]
impl MediaBackend for CliBackend {
    async fn fetch_metadata(&self, url: &str) -> MediaResult<SourceMetadata> {
        let runner = self.runner(&self.yt_dlp, self.timeouts.metadata);
        ytdlp::fetch_metadata(&runner, url).await
    }

    async fn download(&self, request: &RetrievalRequest, dir: &Path, stem: &str) -> MediaResult<PathBuf> {
        let runner = self.runner(&self.yt_dlp, self.timeouts.download);
        // yt-dlp finds ffmpeg itself when it is on PATH; only pass explicit paths.
        let ffmpeg_location = self.ffmpeg.resolve().ok();
        if ffmpeg_location.is_none() {
            debug!(program = %self.ffmpeg.program(), "ffmpeg not resolved, leaving lookup to yt-dlp");
        }
        ytdlp::download(&runner, request, dir, stem, ffmpeg_location.as_deref()).await
    }

    async fn trim(&self, input: &Path, output: &Path, range: &TrimRange) -> MediaResult<()> {
        let runner = self.runner(&self.ffmpeg, self.timeouts.trim);
        ffmpeg::trim(&runner, input, output, range).await
    }

    fn tool_status(&self) -> Vec<ToolStatus> {
        [&self.yt_dlp, &self.ffmpeg]
            .into_iter()
            .map(|tool| {
                let resolved = tool.resolve().ok();
                ToolStatus {
                    name: tool.name().to_string(),
                    available: resolved.is_some(),
                    path: resolved.map(|p| p.display().to_string()),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = ToolTimeouts::default();
        assert_eq!(timeouts.metadata.as_secs(), 60);
        assert_eq!(timeouts.download.as_secs(), 1800);
        assert_eq!(timeouts.trim.as_secs(), 600);
    }

    #[test]
    fn test_missing_tools_reported() {
        let backend = CliBackend::new(
            "vgrab-missing-yt-dlp",
            "vgrab-missing-ffmpeg",
            ToolTimeouts::default(),
        );
        let status = backend.tool_status();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].name, "yt-dlp");
        assert!(status.iter().all(|s| !s.available && s.path.is_none()));
    }

    #[cfg(unix)]
    mod with_tools {
        use super::*;
        use crate::command::script_tool;
        use crate::{MediaError, RetrievalPipeline, DEFAULT_MAX_DURATION_SECS};
        use std::sync::Arc;
        use tokio_test::{assert_err, assert_ok};
        use vgrab_models::{HostPolicy, RetrievalParams, RetrievalRequest};

        /// Backend over stand-ins: yt-dlp answers metadata queries and writes
        /// its download with `ext`; ffmpeg copies a marker into its output.
        fn backend(bin: &Path, ext: &str) -> CliBackend {
            let yt_dlp = script_tool(
                bin,
                "yt-dlp",
                &format!(
                    r#"case " $* " in
  *" --dump-single-json "*) printf '{{"id":"x","title":"T","duration":100}}'; exit 0;;
esac
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
printf media > "${{out%.*}}.{ext}""#
                ),
            );
            let ffmpeg = script_tool(bin, "ffmpeg", r#"for last; do :; done; printf trimmed > "$last""#);
            CliBackend::new(yt_dlp.program(), ffmpeg.program(), ToolTimeouts::default())
        }

        fn request(end: Option<&str>) -> RetrievalRequest {
            RetrievalParams {
                url: Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string()),
                end: end.map(str::to_string),
                ..Default::default()
            }
            .validate(&HostPolicy::default())
            .unwrap()
        }

        fn residual(root: &Path) -> usize {
            std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
        }

        #[tokio::test]
        async fn test_pipeline_over_cli_tools() {
            let bin = tempfile::tempdir().unwrap();
            let root = tempfile::tempdir().unwrap();
            let pipeline = RetrievalPipeline::new(Arc::new(backend(bin.path(), "mp4")), root.path(), DEFAULT_MAX_DURATION_SECS);

            let media = assert_ok!(pipeline.retrieve(&request(Some("10")), "cli-1").await);
            assert_eq!(media.metadata.title, "T");
            assert_eq!(media.content_type, "video/mp4");
            assert!(media.filename.starts_with("T_trim_"), "{}", media.filename);
            assert!(media.filename.ends_with(".mp4"), "{}", media.filename);
            assert_eq!(std::fs::read(&media.path).unwrap(), b"trimmed");

            drop(media);
            assert_eq!(residual(root.path()), 0);
        }

        #[tokio::test]
        async fn test_pipeline_refuses_wrong_container() {
            let bin = tempfile::tempdir().unwrap();
            let root = tempfile::tempdir().unwrap();
            let pipeline = RetrievalPipeline::new(Arc::new(backend(bin.path(), "webm")), root.path(), DEFAULT_MAX_DURATION_SECS);

            let err = assert_err!(pipeline.retrieve(&request(None), "cli-2").await);
            assert!(matches!(err, MediaError::ToolFailed { tool: "yt-dlp", .. }), "{err}");
            assert_eq!(residual(root.path()), 0);
        }
    }

    #[tokio::test]
    async fn test_missing_tool_fails_metadata() {
        let backend = CliBackend::new("vgrab-missing-yt-dlp", "ffmpeg", ToolTimeouts::default());
        let err = backend.fetch_metadata("https://youtu.be/x").await.unwrap_err();
        assert!(matches!(err, crate::MediaError::ToolNotFound { tool: "yt-dlp", .. }));
    }
}
