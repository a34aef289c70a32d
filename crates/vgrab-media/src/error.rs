//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use vgrab_models::TimestampError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while fetching, downloading or trimming media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{tool} not found (looked for '{path}')")]
    ToolNotFound { tool: &'static str, path: String },

    #[error("Failed to start {tool}: {source}")]
    SpawnFailed {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {message}")]
    ToolFailed {
        tool: &'static str,
        message: String,
        exit_code: Option<i32>,
    },

    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: &'static str, secs: u64 },

    #[error("Failed to parse {tool} output: {message}")]
    InvalidOutput { tool: &'static str, message: String },

    #[error("{tool} reported success but produced no output file at {path}")]
    OutputMissing { tool: &'static str, path: PathBuf },

    #[error("Video duration ({duration:.0}s) exceeds the maximum allowed ({limit:.0}s)")]
    DurationExceeded { duration: f64, limit: f64 },

    #[error("Video duration is unknown (live streams cannot be downloaded)")]
    DurationUnknown,

    #[error("Invalid trim range: {0}")]
    InvalidTrim(#[from] TimestampError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a tool failure from captured stderr.
    ///
    /// The message is the last non-empty diagnostic line, which is where
    /// yt-dlp and FFmpeg put the actual error.
    pub fn tool_failed(tool: &'static str, stderr: &str, exit_code: Option<i32>) -> Self {
        let message = stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .map(str::to_string)
            .unwrap_or_else(|| match exit_code {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            });

        Self::ToolFailed {
            tool,
            message,
            exit_code,
        }
    }

    /// Whether the error was caused by the request rather than the service
    /// or its tools.
    pub fn is_client_error(&self) -> bool {
        matches!(self, MediaError::InvalidTrim(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_uses_last_line() {
        let err = MediaError::tool_failed(
            "yt-dlp",
            "[youtube] abc: Downloading webpage\nERROR: [youtube] abc: Video unavailable\n\n",
            Some(1),
        );
        assert_eq!(
            err.to_string(),
            "yt-dlp failed: ERROR: [youtube] abc: Video unavailable"
        );
    }

    #[test]
    fn test_tool_failed_without_stderr() {
        let err = MediaError::tool_failed("ffmpeg", "", Some(234));
        assert_eq!(err.to_string(), "ffmpeg failed: exited with status 234");
    }

    #[test]
    fn test_client_errors() {
        assert!(MediaError::InvalidTrim(TimestampError::StartNotBeforeEnd).is_client_error());
        assert!(!MediaError::DurationExceeded { duration: 4000.0, limit: 3600.0 }.is_client_error());
    }
}
