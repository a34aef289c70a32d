//! API description document served at `/`.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use vgrab_models::request::{BITRATE_RANGE_KBPS, DEFAULT_BITRATE_KBPS};
use vgrab_models::{Container, Mode};

use crate::state::AppState;

#[derive(Serialize)]
pub struct ApiDescription {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointDescription>,
    pub limits: Limits,
}

#[derive(Serialize)]
pub struct EndpointDescription {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDescription>,
}

#[derive(Serialize)]
pub struct ParamDescription {
    pub name: &'static str,
    pub required: bool,
    pub description: String,
}

#[derive(Serialize)]
pub struct Limits {
    pub max_duration_secs: u64,
    pub allowed_hosts: Vec<String>,
    pub containers: ContainerLimits,
}

#[derive(Serialize)]
pub struct ContainerLimits {
    pub video: Vec<&'static str>,
    pub audio: Vec<&'static str>,
}

fn param(name: &'static str, required: bool, description: impl Into<String>) -> ParamDescription {
    ParamDescription {
        name,
        required,
        description: description.into(),
    }
}

fn extensions(mode: Mode) -> Vec<&'static str> {
    mode.containers().iter().map(Container::extension).collect()
}

/// Describe the API.
pub async fn index(State(state): State<AppState>) -> Json<ApiDescription> {
    let url = || param("url", true, "Video page URL on an allowed host");

    Json(ApiDescription {
        name: "vgrab",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            EndpointDescription {
                method: "GET",
                path: "/health",
                description: "Liveness check",
                params: Vec::new(),
            },
            EndpointDescription {
                method: "GET",
                path: "/ready",
                description: "Readiness check, reports whether yt-dlp and ffmpeg are available",
                params: Vec::new(),
            },
            EndpointDescription {
                method: "GET",
                path: "/info",
                description: "Video metadata",
                params: vec![url()],
            },
            EndpointDescription {
                method: "GET",
                path: "/download",
                description: "Download a video or its audio track as an attachment",
                params: vec![
                    url(),
                    param("mode", false, "video (default) or audio"),
                    param("quality", false, "Maximum video height such as 720p, or best (default 720p)"),
                    param("container", false, "Output container (default mp4 for video, mp3 for audio)"),
                    param(
                        "bitrate",
                        false,
                        format!(
                            "Audio bitrate in kbit/s, {}-{} (default {})",
                            BITRATE_RANGE_KBPS.start(),
                            BITRATE_RANGE_KBPS.end(),
                            DEFAULT_BITRATE_KBPS
                        ),
                    ),
                    param("start", false, "Trim start as HH:MM:SS, MM:SS or seconds"),
                    param("end", false, "Trim end as HH:MM:SS, MM:SS or seconds"),
                ],
            },
        ],
        limits: Limits {
            max_duration_secs: state.config.max_duration_secs,
            allowed_hosts: state.host_policy.domains().to_vec(),
            containers: ContainerLimits {
                video: extensions(Mode::Video),
                audio: extensions(Mode::Audio),
            },
        },
    })
}
