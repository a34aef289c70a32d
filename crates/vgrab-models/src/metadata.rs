//! Source metadata returned by `/info`.

use serde::{Deserialize, Serialize};

/// Normalized metadata for a source video.
///
/// Always fetched fresh for the request at hand; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Identifier assigned by the hosting site
    pub id: String,
    /// Video title
    pub title: String,
    /// Duration in seconds (absent for live streams)
    pub duration: Option<f64>,
    /// Thumbnail URL
    pub thumbnail: Option<String>,
    /// Uploader or channel name
    pub uploader: Option<String>,
    /// Upload date as reported by the source (`YYYYMMDD`)
    pub upload_date: Option<String>,
}

impl SourceMetadata {
    /// Whether the reported duration is known and within `limit_secs`.
    pub fn within_duration(&self, limit_secs: f64) -> bool {
        self.duration.is_some_and(|d| d <= limit_secs)
    }
}
