//! yt-dlp format selection.
//!
//! Turns a validated request into the `-f` selector expression and the
//! post-processing flags that make yt-dlp produce the requested container.

use vgrab_models::{Container, Mode, Quality, RetrievalRequest};

/// Format selector for a video download.
///
/// Prefers separate streams in the target container, falls back to any
/// separate streams within the height cap, then to a single muxed file.
pub fn video_selector(quality: Quality, container: Container) -> String {
    let height = quality
        .max_height()
        .map(|h| format!("[height<={}]", h))
        .unwrap_or_default();

    let (video_ext, audio_ext) = match container {
        Container::Mp4 => ("[ext=mp4]", "[ext=m4a]"),
        Container::Webm => ("[ext=webm]", "[ext=webm]"),
        _ => ("", ""),
    };

    let mut alternatives = Vec::with_capacity(4);
    if !video_ext.is_empty() {
        alternatives.push(format!("bestvideo{height}{video_ext}+bestaudio{audio_ext}"));
    }
    alternatives.push(format!("bestvideo{height}+bestaudio"));
    alternatives.push(format!("best{height}"));
    alternatives.push("best".to_string());
    alternatives.dedup();
    alternatives.join("/")
}

/// Format selector for an audio-only download.
pub fn audio_selector() -> String {
    "bestaudio/best".to_string()
}

/// Selector plus container flags for `request`.
pub fn format_args(request: &RetrievalRequest) -> Vec<String> {
    let container = request.container().extension().to_string();
    match request.mode() {
        Mode::Video => vec![
            "-f".to_string(),
            video_selector(request.quality(), request.container()),
            "--merge-output-format".to_string(),
            container.clone(),
            "--remux-video".to_string(),
            container,
        ],
        Mode::Audio => vec![
            "-f".to_string(),
            audio_selector(),
            "-x".to_string(),
            "--audio-format".to_string(),
            container,
            "--audio-quality".to_string(),
            format!("{}K", request.bitrate_kbps()),
        ],
    }
}
