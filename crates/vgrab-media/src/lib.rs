//! yt-dlp and FFmpeg CLI wrappers for media retrieval.
//!
//! This crate provides:
//! - A timeout-bounded external tool runner
//! - Metadata lookup and format-selected downloads via yt-dlp
//! - Stream-copy trimming via FFmpeg
//! - The retrieval pipeline with per-request scratch directories

pub mod backend;
pub mod command;
pub mod error;
pub mod ffmpeg;
pub mod format;
pub mod pipeline;
pub mod scratch;
pub mod stage;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod ytdlp;

pub use backend::{CliBackend, MediaBackend, ToolStatus, ToolTimeouts};
pub use command::{Tool, ToolOutput, ToolRunner};
pub use error::{MediaError, MediaResult};
pub use ffmpeg::FfmpegCommand;
pub use pipeline::{PreparedMedia, RetrievalPipeline, DEFAULT_MAX_DURATION_SECS};
pub use scratch::{unique_stem, ScratchDir};
pub use stage::{RetrievalStage, StageTracker};
