//! Retrieval request model.
//!
//! A [`RetrievalRequest`] is built once per `/download` call from the raw
//! [`RetrievalParams`] and is read-only afterwards. All validation happens
//! here, before any external process is spawned.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::source_url::{HostPolicy, SourceUrlError};
use crate::timestamp::{TimestampError, TrimRange};

/// Default audio bitrate in kbit/s.
pub const DEFAULT_BITRATE_KBPS: u32 = 192;

/// Accepted audio bitrate range in kbit/s.
pub const BITRATE_RANGE_KBPS: std::ops::RangeInclusive<u32> = 32..=320;

/// Accepted video height range for `quality`.
pub const HEIGHT_RANGE: std::ops::RangeInclusive<u32> = 144..=4320;

/// Validation failures for a retrieval request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error(transparent)]
    Url(#[from] SourceUrlError),

    #[error("Invalid mode '{0}'. Use 'video' or 'audio'")]
    InvalidMode(String),

    #[error("Invalid quality '{0}'. Use 'best' or a height such as '720p'")]
    InvalidQuality(String),

    #[error("Invalid container '{container}' for {mode} mode. Supported: {supported}")]
    InvalidContainer {
        container: String,
        mode: Mode,
        supported: String,
    },

    #[error("Invalid bitrate '{0}'. Use a value between 32 and 320 (kbit/s)")]
    InvalidBitrate(String),

    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

/// What the client wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Video with audio.
    #[default]
    Video,
    /// Audio only.
    Audio,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Video => "video",
            Mode::Audio => "audio",
        }
    }

    /// Container used when the request does not name one.
    pub fn default_container(&self) -> Container {
        match self {
            Mode::Video => Container::Mp4,
            Mode::Audio => Container::Mp3,
        }
    }

    /// Containers valid for this mode.
    pub fn containers(&self) -> &'static [Container] {
        match self {
            Mode::Video => &[Container::Mp4, Container::Webm, Container::Mkv],
            Mode::Audio => &[
                Container::Mp3,
                Container::M4a,
                Container::Opus,
                Container::Wav,
                Container::Flac,
            ],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(Mode::Video),
            "audio" => Ok(Mode::Audio),
            _ => Err(RequestError::InvalidMode(s.to_string())),
        }
    }
}

/// Target video quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Highest available resolution.
    Best,
    /// Highest resolution not taller than the given height.
    MaxHeight(u32),
}

impl Default for Quality {
    fn default() -> Self {
        Quality::MaxHeight(720)
    }
}

impl Quality {
    /// Height cap, if any.
    pub fn max_height(&self) -> Option<u32> {
        match self {
            Quality::Best => None,
            Quality::MaxHeight(h) => Some(*h),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Best => f.write_str("best"),
            Quality::MaxHeight(h) => write!(f, "{}p", h),
        }
    }
}

impl FromStr for Quality {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized == "best" || normalized == "highest" {
            return Ok(Quality::Best);
        }
        let digits = normalized.strip_suffix('p').unwrap_or(&normalized);
        match digits.parse::<u32>() {
            Ok(h) if HEIGHT_RANGE.contains(&h) => Ok(Quality::MaxHeight(h)),
            _ => Err(RequestError::InvalidQuality(s.to_string())),
        }
    }
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Webm,
    Mkv,
    Mp3,
    M4a,
    Opus,
    Wav,
    Flac,
}

impl Container {
    /// File extension, also the name passed to the download tool.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
            Container::Mkv => "mkv",
            Container::Mp3 => "mp3",
            Container::M4a => "m4a",
            Container::Opus => "opus",
            Container::Wav => "wav",
            Container::Flac => "flac",
        }
    }

    /// `Content-Type` for a file in this container.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Container::Mp4 => "video/mp4",
            Container::Webm => "video/webm",
            Container::Mkv => "video/x-matroska",
            Container::Mp3 => "audio/mpeg",
            Container::M4a => "audio/mp4",
            Container::Opus => "audio/ogg",
            Container::Wav => "audio/wav",
            Container::Flac => "audio/flac",
        }
    }

    /// Mode this container belongs to.
    pub fn mode(&self) -> Mode {
        match self {
            Container::Mp4 | Container::Webm | Container::Mkv => Mode::Video,
            _ => Mode::Audio,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Container::Mp4,
            "webm" => Container::Webm,
            "mkv" => Container::Mkv,
            "mp3" => Container::Mp3,
            "m4a" => Container::M4a,
            "opus" => Container::Opus,
            "wav" => Container::Wav,
            "flac" => Container::Flac,
            _ => return None,
        })
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Raw `/download` query parameters, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievalParams {
    pub url: Option<String>,
    pub mode: Option<String>,
    pub quality: Option<String>,
    pub container: Option<String>,
    pub bitrate: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RetrievalParams {
    /// Validate the raw parameters into a [`RetrievalRequest`].
    pub fn validate(&self, policy: &HostPolicy) -> Result<RetrievalRequest, RequestError> {
        let url = policy.validate(self.url.as_deref())?;

        let mode = match present(&self.mode) {
            Some(m) => m.parse()?,
            None => Mode::default(),
        };

        let quality = match present(&self.quality) {
            Some(q) => q.parse()?,
            None => Quality::default(),
        };

        let container = match present(&self.container) {
            Some(c) => Container::parse(c)
                .filter(|c| c.mode() == mode)
                .ok_or_else(|| RequestError::InvalidContainer {
                    container: c.to_string(),
                    mode,
                    supported: mode
                        .containers()
                        .iter()
                        .map(Container::extension)
                        .collect::<Vec<_>>()
                        .join(", "),
                })?,
            None => mode.default_container(),
        };

        let bitrate_kbps = match present(&self.bitrate) {
            Some(b) => b
                .trim_end_matches(['k', 'K'])
                .parse::<u32>()
                .ok()
                .filter(|b| BITRATE_RANGE_KBPS.contains(b))
                .ok_or_else(|| RequestError::InvalidBitrate(b.to_string()))?,
            None => DEFAULT_BITRATE_KBPS,
        };

        let trim = TrimRange::from_bounds(self.start.as_deref(), self.end.as_deref())?;

        Ok(RetrievalRequest {
            url,
            mode,
            quality,
            container,
            bitrate_kbps,
            trim,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A validated, immutable retrieval request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalRequest {
    url: Url,
    mode: Mode,
    quality: Quality,
    container: Container,
    bitrate_kbps: u32,
    trim: Option<TrimRange>,
}

impl RetrievalRequest {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn container(&self) -> Container {
        self.container
    }

    pub fn bitrate_kbps(&self) -> u32 {
        self.bitrate_kbps
    }

    pub fn trim(&self) -> Option<&TrimRange> {
        self.trim.as_ref()
    }
}
