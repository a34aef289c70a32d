//! Recording fake backend for tests.
//!
//! Never spawns a process. Downloads and trims write small files where the
//! real tools would, so cleanup and naming behave as in production.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use vgrab_models::{RetrievalRequest, SourceMetadata, TrimRange};

use crate::backend::{MediaBackend, ToolStatus};
use crate::error::{MediaError, MediaResult};

/// In-memory [`MediaBackend`] that records every call.
#[derive(Debug)]
pub struct FakeBackend {
    metadata: SourceMetadata,
    fail_metadata: bool,
    fail_download: bool,
    fail_trim: bool,
    metadata_calls: AtomicUsize,
    download_calls: AtomicUsize,
    trim_calls: AtomicUsize,
    last_trim: Mutex<Option<(f64, Option<f64>)>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    /// Bytes written for every fake download.
    pub const DOWNLOAD_BYTES: &'static [u8] = b"fake media payload";

    pub fn new() -> Self {
        Self {
            metadata: SourceMetadata {
                id: "dQw4w9WgXcQ".to_string(),
                title: "Fake Video".to_string(),
                duration: Some(212.0),
                thumbnail: Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string()),
                uploader: Some("Fake Channel".to_string()),
                upload_date: Some("20091025".to_string()),
            },
            fail_metadata: false,
            fail_download: false,
            fail_trim: false,
            metadata_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
            trim_calls: AtomicUsize::new(0),
            last_trim: Mutex::new(None),
        }
    }

    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.metadata.duration = duration;
        self
    }

    pub fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    pub fn failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    pub fn failing_trim(mut self) -> Self {
        self.fail_trim = true;
        self
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn trim_calls(&self) -> usize {
        self.trim_calls.load(Ordering::SeqCst)
    }

    /// Total number of external operations attempted.
    pub fn total_calls(&self) -> usize {
        self.metadata_calls() + self.download_calls() + self.trim_calls()
    }

    /// `(start, length)` in seconds of the most recent trim.
    pub fn last_trim_window(&self) -> Option<(f64, Option<f64>)> {
        self.last_trim.lock().ok().and_then(|guard| *guard)
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn fetch_metadata(&self, _url: &str) -> MediaResult<SourceMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_metadata {
            return Err(MediaError::tool_failed(
                "yt-dlp",
                "ERROR: [youtube] dQw4w9WgXcQ: Video unavailable",
                Some(1),
            ));
        }
        Ok(self.metadata.clone())
    }

    async fn download(&self, request: &RetrievalRequest, dir: &Path, stem: &str) -> MediaResult<PathBuf> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_download {
            // a real failure leaves partial files behind
            tokio::fs::write(dir.join(format!("{}.part", stem)), b"partial").await?;
            return Err(MediaError::tool_failed("yt-dlp", "ERROR: unable to download video data", Some(1)));
        }
        let path = dir.join(format!("{}.{}", stem, request.container().extension()));
        tokio::fs::write(&path, Self::DOWNLOAD_BYTES).await?;
        Ok(path)
    }

    async fn trim(&self, input: &Path, output: &Path, range: &TrimRange) -> MediaResult<()> {
        self.trim_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_trim.lock() {
            *last = Some((range.start_secs(), range.length_secs()));
        }
        if self.fail_trim {
            return Err(MediaError::tool_failed("ffmpeg", "Invalid data found when processing input", Some(1)));
        }
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    fn tool_status(&self) -> Vec<ToolStatus> {
        ["yt-dlp", "ffmpeg"]
            .into_iter()
            .map(|name| ToolStatus {
                name: name.to_string(),
                available: true,
                path: None,
            })
            .collect()
    }
}
