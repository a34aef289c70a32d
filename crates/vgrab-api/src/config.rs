//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use vgrab_media::{ToolTimeouts, DEFAULT_MAX_DURATION_SECS};
use vgrab_models::{HostPolicy, DEFAULT_ALLOWED_HOSTS};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// `json` in any case selects JSON; anything else is text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// yt-dlp program name or path
    pub ytdlp_path: String,
    /// FFmpeg program name or path
    pub ffmpeg_path: String,
    /// Root for per-request scratch directories
    pub temp_dir: PathBuf,
    /// Longest source accepted for download, in seconds
    pub max_duration_secs: u64,
    pub metadata_timeout: Duration,
    pub download_timeout: Duration,
    pub trim_timeout: Duration,
    /// Hosts (and their subdomains) accepted as sources
    pub allowed_hosts: Vec<String>,
    /// Per-IP requests per second, 0 disables rate limiting
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Whether `/metrics` is exposed
    pub metrics_enabled: bool,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let timeouts = ToolTimeouts::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["*".to_string()],
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            temp_dir: std::env::temp_dir(),
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            metadata_timeout: timeouts.metadata,
            download_timeout: timeouts.download,
            trim_timeout: timeouts.trim,
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            rate_limit_rps: 0,
            rate_limit_burst: 20,
            metrics_enabled: true,
            log_format: LogFormat::Text,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            cors_origins: env_list("CORS_ORIGIN").unwrap_or(defaults.cors_origins),
            ytdlp_path: env_non_empty("YTDLP_PATH").unwrap_or(defaults.ytdlp_path),
            ffmpeg_path: env_non_empty("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            temp_dir: env_non_empty("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            max_duration_secs: env_parse("MAX_DURATION_SECS").unwrap_or(defaults.max_duration_secs),
            metadata_timeout: env_secs("METADATA_TIMEOUT_SECS").unwrap_or(defaults.metadata_timeout),
            download_timeout: env_secs("DOWNLOAD_TIMEOUT_SECS").unwrap_or(defaults.download_timeout),
            trim_timeout: env_secs("TRIM_TIMEOUT_SECS").unwrap_or(defaults.trim_timeout),
            allowed_hosts: env_list("ALLOWED_HOSTS").unwrap_or(defaults.allowed_hosts),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off"))
                .unwrap_or(defaults.metrics_enabled),
            log_format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
        }
    }

    /// Source host allowlist.
    pub fn host_policy(&self) -> HostPolicy {
        HostPolicy::new(self.allowed_hosts.iter().map(String::as_str))
    }

    /// Per-tool timeouts.
    pub fn tool_timeouts(&self) -> ToolTimeouts {
        ToolTimeouts {
            metadata: self.metadata_timeout,
            download: self.download_timeout,
            trim: self.trim_timeout,
        }
    }

    /// Whether rate limiting is enabled.
    pub fn rate_limit_enabled(&self) -> bool {
        self.rate_limit_rps > 0
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_non_empty(key).and_then(|s| s.parse().ok())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).filter(|s| *s > 0).map(Duration::from_secs)
}

fn env_list(key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = env_non_empty(key)?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_duration_secs, 3600);
        assert_eq!(config.metadata_timeout, Duration::from_secs(60));
        assert!(!config.rate_limit_enabled());
        assert!(config.metrics_enabled);
        assert!(config.host_policy().allows_host("www.youtube.com"));
    }

    #[test]
    fn test_log_format_ignores_case() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" Json "), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }

    #[test]
    fn test_custom_hosts() {
        let config = ApiConfig {
            allowed_hosts: vec!["vimeo.com".to_string()],
            ..Default::default()
        };
        let policy = config.host_policy();
        assert!(policy.allows_host("player.vimeo.com"));
        assert!(!policy.allows_host("youtube.com"));
    }
}
