//! Metadata lookup and download using yt-dlp.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use vgrab_models::{RetrievalRequest, SourceMetadata};

use crate::command::ToolRunner;
use crate::error::{MediaError, MediaResult};
use crate::format::format_args;

/// Flags shared by every yt-dlp invocation.
const COMMON_ARGS: &[&str] = &["--no-playlist", "--no-warnings", "--socket-timeout", "30"];

/// Subset of yt-dlp's `--dump-single-json` output that we expose.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: String,
    title: Option<String>,
    fulltitle: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    upload_date: Option<String>,
}

impl From<YtDlpInfo> for SourceMetadata {
    fn from(info: YtDlpInfo) -> Self {
        SourceMetadata {
            id: info.id,
            title: info
                .title
                .or(info.fulltitle)
                .unwrap_or_else(|| "untitled".to_string()),
            duration: info.duration,
            thumbnail: info.thumbnail,
            uploader: info.uploader.or(info.channel),
            upload_date: info.upload_date,
        }
    }
}

/// Parse yt-dlp JSON output into [`SourceMetadata`].
pub fn parse_metadata(stdout: &[u8]) -> MediaResult<SourceMetadata> {
    let info: YtDlpInfo = serde_json::from_slice(stdout).map_err(|e| MediaError::InvalidOutput {
        tool: "yt-dlp",
        message: e.to_string(),
    })?;
    Ok(info.into())
}

/// Arguments for a metadata lookup.
pub fn metadata_args(url: &str) -> Vec<String> {
    let mut args: Vec<String> = vec!["--dump-single-json".to_string(), "--skip-download".to_string()];
    args.extend(COMMON_ARGS.iter().map(|s| s.to_string()));
    args.push("--".to_string());
    args.push(url.to_string());
    args
}

/// Fetch metadata for `url`.
pub async fn fetch_metadata(runner: &ToolRunner, url: &str) -> MediaResult<SourceMetadata> {
    info!(url = %url, "Fetching metadata");
    let output = runner.run(&metadata_args(url)).await?;
    let metadata = parse_metadata(&output.stdout)?;
    debug!(id = %metadata.id, duration = ?metadata.duration, "Metadata fetched");
    Ok(metadata)
}

/// Arguments for downloading `request` to `<dir>/<stem>.<ext>`.
///
/// `ffmpeg_location` is passed through so yt-dlp merges and extracts with
/// the same FFmpeg the service trims with.
pub fn download_args(
    request: &RetrievalRequest,
    dir: &Path,
    stem: &str,
    ffmpeg_location: Option<&Path>,
) -> Vec<String> {
    let template = dir.join(format!("{}.%(ext)s", stem));

    let mut args: Vec<String> = COMMON_ARGS.iter().map(|s| s.to_string()).collect();
    args.extend(["--no-progress".to_string(), "--no-part".to_string()]);
    args.extend(format_args(request));
    if let Some(ffmpeg) = ffmpeg_location {
        args.push("--ffmpeg-location".to_string());
        args.push(ffmpeg.to_string_lossy().into_owned());
    }
    args.push("-o".to_string());
    args.push(template.to_string_lossy().into_owned());
    args.push("--".to_string());
    args.push(request.url().as_str().to_string());
    args
}

/// Download `request` into `dir`, naming the output after `stem`.
///
/// Success requires a zero exit status and a produced file in the requested
/// container. A file left in any other container (a failed remux or audio
/// conversion) is reported as a failure instead of being served under the
/// wrong type.
pub async fn download(
    runner: &ToolRunner,
    request: &RetrievalRequest,
    dir: &Path,
    stem: &str,
    ffmpeg_location: Option<&Path>,
) -> MediaResult<PathBuf> {
    info!(
        url = %request.url(),
        mode = %request.mode(),
        quality = %request.quality(),
        container = %request.container(),
        "Downloading"
    );

    runner
        .run(&download_args(request, dir, stem, ffmpeg_location))
        .await?;

    let tool = runner.tool().name();
    let extension = request.container().extension();
    let expected = dir.join(format!("{}.{}", stem, extension));
    let path = locate_output(dir, stem, &expected)
        .await?
        .ok_or_else(|| MediaError::OutputMissing {
            tool,
            path: expected.clone(),
        })?;

    if path != expected {
        let produced = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(MediaError::ToolFailed {
            tool,
            message: format!("requested {} container was not produced (got '{}')", extension, produced),
            exit_code: None,
        });
    }

    let size = tokio::fs::metadata(&path).await?.len();
    info!(output = %path.display(), size_bytes = size, "Download finished");
    Ok(path)
}

/// Find the file yt-dlp produced for `stem`.
///
/// The expected `<stem>.<container>` wins; otherwise the single remaining
/// file sharing the stem is returned so the caller can report what was
/// produced instead.
async fn locate_output(dir: &Path, stem: &str, expected: &Path) -> MediaResult<Option<PathBuf>> {
    if tokio::fs::try_exists(expected).await? {
        return Ok(Some(expected.to_path_buf()));
    }

    let prefix = format!("{}.", stem);
    let mut candidates = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && !name.ends_with(".part") && !name.ends_with(".ytdl") {
            candidates.push(entry.path());
        }
    }

    Ok(match candidates.len() {
        1 => candidates.pop(),
        _ => None,
    })
}
