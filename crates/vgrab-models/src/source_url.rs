//! Source URL validation against an allowlist of media-hosting domains.
//!
//! URLs are untrusted input. A URL is accepted only when it parses, uses
//! http(s), and its host is an allowlisted domain or a subdomain of one.

use thiserror::Error;
use url::Url;

/// Maximum URL length accepted from clients.
pub const MAX_URL_LENGTH: usize = 2048;

/// Domains accepted when no allowlist is configured.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

/// Reasons a source URL is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceUrlError {
    #[error("Missing url parameter")]
    Missing,

    #[error("URL exceeds maximum length of {MAX_URL_LENGTH} characters")]
    TooLong,

    #[error("Invalid URL format: {0}")]
    Malformed(String),

    #[error("Invalid protocol '{0}'. Only HTTP and HTTPS are allowed")]
    UnsupportedScheme(String),

    #[error("URL must have a valid host")]
    MissingHost,

    #[error("Host '{0}' is not a supported media host")]
    HostNotAllowed(String),
}

/// Allowlist of media-hosting domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPolicy {
    allowed: Vec<String>,
}

impl Default for HostPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS.iter().copied())
    }
}

impl HostPolicy {
    /// Create a policy from a list of domains. Entries are lowercased and a
    /// leading `www.` or `.` is dropped, since subdomains match anyway.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = domains
            .into_iter()
            .map(|d| {
                let d = d.as_ref().trim().to_ascii_lowercase();
                let d = d.trim_start_matches('.');
                d.strip_prefix("www.").unwrap_or(d).to_string()
            })
            .filter(|d| !d.is_empty())
            .collect();
        Self { allowed }
    }

    /// Parse a comma-separated allowlist, falling back to the defaults when
    /// the list is empty.
    pub fn from_csv(csv: &str) -> Self {
        let policy = Self::new(csv.split(','));
        if policy.allowed.is_empty() {
            Self::default()
        } else {
            policy
        }
    }

    /// Allowlisted domains.
    pub fn domains(&self) -> &[String] {
        &self.allowed
    }

    /// Whether `host` is an allowlisted domain or one of its subdomains.
    pub fn allows_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.allowed.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Validate a raw URL taken from a query string.
    pub fn validate(&self, raw: Option<&str>) -> Result<Url, SourceUrlError> {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(SourceUrlError::Missing);
        }
        if raw.len() > MAX_URL_LENGTH {
            return Err(SourceUrlError::TooLong);
        }

        let parsed = Url::parse(raw).map_err(|e| SourceUrlError::Malformed(e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => return Err(SourceUrlError::UnsupportedScheme(scheme.to_string())),
        }

        let host = parsed.host_str().ok_or(SourceUrlError::MissingHost)?;
        if !self.allows_host(host) {
            return Err(SourceUrlError::HostNotAllowed(host.to_string()));
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_youtube_urls() {
        let policy = HostPolicy::default();
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://YOUTUBE.COM/shorts/dQw4w9WgXcQ",
            "  https://youtu.be/dQw4w9WgXcQ  ",
        ] {
            assert!(policy.validate(Some(url)).is_ok(), "expected {url} to be accepted");
        }
    }

    #[test]
    fn test_lookalike_hosts_rejected() {
        let policy = HostPolicy::default();
        for url in [
            "https://notyoutube.com/watch?v=x",
            "https://youtube.com.evil.example/watch?v=x",
            "https://evil.example/?next=youtube.com",
            "https://vimeo.com/123",
        ] {
            assert!(
                matches!(policy.validate(Some(url)), Err(SourceUrlError::HostNotAllowed(_))),
                "expected {url} to be rejected"
            );
        }
    }

    #[test]
    fn test_missing_and_malformed() {
        let policy = HostPolicy::default();
        assert_eq!(policy.validate(None), Err(SourceUrlError::Missing));
        assert_eq!(policy.validate(Some("   ")), Err(SourceUrlError::Missing));
        assert!(matches!(policy.validate(Some("not a url")), Err(SourceUrlError::Malformed(_))));
        let long = format!("https://youtube.com/watch?v={}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(policy.validate(Some(&long)), Err(SourceUrlError::TooLong));
    }

    #[test]
    fn test_invalid_protocols() {
        let policy = HostPolicy::default();
        assert!(matches!(
            policy.validate(Some("ftp://youtube.com/video")),
            Err(SourceUrlError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            policy.validate(Some("javascript:alert(1)")),
            Err(SourceUrlError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_custom_allowlist() {
        let policy = HostPolicy::from_csv("vimeo.com, www.example.org");
        assert_eq!(policy.domains(), ["vimeo.com", "example.org"]);
        assert!(policy.validate(Some("https://player.vimeo.com/video/1")).is_ok());
        assert!(policy.validate(Some("https://www.example.org/v")).is_ok());
        assert!(policy.validate(Some("https://youtube.com/watch?v=x")).is_err());
    }

    #[test]
    fn test_empty_csv_falls_back_to_defaults() {
        assert_eq!(HostPolicy::from_csv(" , "), HostPolicy::default());
    }
}
