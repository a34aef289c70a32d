//! Download filenames and `Content-Disposition` values.

use crate::request::Container;
use crate::timestamp::TrimRange;

/// Maximum length (in chars) of the title part of a filename.
pub const MAX_FILENAME_STEM: usize = 150;

/// Stem used when a title sanitizes to nothing.
const FALLBACK_STEM: &str = "download";

/// Characters that are unsafe in filenames on common filesystems.
const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Make a title safe to use as a filename stem.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if RESERVED.contains(&c) || c.is_control() { ' ' } else { c })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed: String = collapsed
        .trim_matches(|c: char| c == '.' || c == ' ')
        .chars()
        .take(MAX_FILENAME_STEM)
        .collect();
    let trimmed = trimmed.trim_end_matches(['.', ' ']);

    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Filename offered to the client: `<title>[<trim marker>].<ext>`.
pub fn attachment_filename(title: &str, trim: Option<&TrimRange>, container: Container) -> String {
    let marker = trim.map(TrimRange::marker).unwrap_or_default();
    format!("{}{}.{}", sanitize_filename(title), marker, container.extension())
}

/// `Content-Disposition` header value with an ASCII fallback and an
/// RFC 5987 encoded UTF-8 name.
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() && c != '"' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_reserved() {
        assert_eq!(sanitize_filename("a/b\\c:d*e?f\"g<h>i|j"), "a b c d e f g h i j");
        assert_eq!(sanitize_filename("line\nbreak\ttab"), "line break tab");
        assert_eq!(sanitize_filename("  ..hidden..  "), "hidden");
    }

    #[test]
    fn test_sanitize_fallback_and_length() {
        assert_eq!(sanitize_filename(""), "download");
        assert_eq!(sanitize_filename("///"), "download");
        let long = "x".repeat(400);
        assert_eq!(sanitize_filename(&long).chars().count(), MAX_FILENAME_STEM);
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_filename("Café – Live"), "Café – Live");
    }

    #[test]
    fn test_attachment_filename_with_trim() {
        let trim = TrimRange::from_bounds(Some("00:01:00"), Some("00:02:00"))
            .unwrap()
            .unwrap();
        assert_eq!(
            attachment_filename("My Video", Some(&trim), Container::Mp4),
            "My Video_trim_00-01-00_00-02-00.mp4"
        );
        assert_eq!(attachment_filename("Song", None, Container::Mp3), "Song.mp3");
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("Song.mp3"),
            "attachment; filename=\"Song.mp3\"; filename*=UTF-8''Song.mp3"
        );
        let header = content_disposition("Café.mp3");
        assert!(header.contains("filename=\"Caf_.mp3\""));
        assert!(header.contains("filename*=UTF-8''Caf%C3%A9.mp3"));
    }
}
