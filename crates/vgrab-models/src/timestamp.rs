//! Timestamp parsing and trim-range validation.
//!
//! Supports `HH:MM:SS`, `HH:MM:SS.mmm`, `MM:SS` and `SS` inputs, the forms
//! accepted by the `start` and `end` query parameters.

use thiserror::Error;

/// Slack allowed between a requested end and the reported media duration.
const END_TOLERANCE_SECS: f64 = 1.0;

/// Timestamp parsing/validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use HH:MM:SS, MM:SS or SS")]
    InvalidFormat(String),

    #[error("Start time must be before end time")]
    StartNotBeforeEnd,

    #[error("Start time ({start_secs:.1}s) is beyond the media duration ({duration:.1}s)")]
    StartBeyondDuration { start_secs: f64, duration: f64 },

    #[error("End time ({end_secs:.1}s) exceeds the media duration ({duration:.1}s)")]
    EndBeyondDuration { end_secs: f64, duration: f64 },
}

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use vgrab_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    let labels: &[&'static str] = match parts.len() {
        1 => &["seconds"],
        2 => &["minutes", "seconds"],
        3 => &["hours", "minutes", "seconds"],
        _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
    };

    let mut total = 0.0;
    for (part, label) in parts.iter().zip(labels) {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| TimestampError::InvalidValue(label, part.to_string()))?;
        if !value.is_finite() {
            return Err(TimestampError::InvalidValue(label, part.to_string()));
        }
        if value < 0.0 {
            return Err(TimestampError::Negative);
        }
        total = total * 60.0 + value;
    }

    Ok(total)
}

/// Format seconds into `HH:MM:SS` or `HH:MM:SS.mmm`.
///
/// The value is rounded to whole milliseconds before it is split, so a
/// component never reads `60`.
pub fn format_seconds(total_secs: f64) -> String {
    let total_ms = (total_secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let mins = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    if millis > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    }
}

/// Requested trim window, in seconds from the start of the media.
///
/// At least one bound is always present. An open start means "from the
/// beginning", an open end means "until the end of the media".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    start: Option<f64>,
    end: Option<f64>,
}

impl TrimRange {
    /// Build a trim range from the raw `start` / `end` query values.
    ///
    /// Returns `Ok(None)` when neither bound is given. Blank values are
    /// treated as absent.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>, TimestampError> {
        let start = non_blank(start).map(parse_timestamp).transpose()?;
        let end = non_blank(end).map(parse_timestamp).transpose()?;

        match (start, end) {
            (None, None) => Ok(None),
            (Some(s), Some(e)) if s >= e => Err(TimestampError::StartNotBeforeEnd),
            (start, end) => Ok(Some(Self { start, end })),
        }
    }

    /// Start offset in seconds (0 when open).
    pub fn start_secs(&self) -> f64 {
        self.start.unwrap_or(0.0)
    }

    /// End offset in seconds, if bounded.
    pub fn end_secs(&self) -> Option<f64> {
        self.end
    }

    /// Window length in seconds, if the end is bounded.
    pub fn length_secs(&self) -> Option<f64> {
        self.end.map(|end| (end - self.start_secs()).max(0.0))
    }

    /// Check the range against the media duration reported by the source.
    pub fn check_against(&self, duration: f64) -> Result<(), TimestampError> {
        let start_secs = self.start_secs();
        if start_secs >= duration {
            return Err(TimestampError::StartBeyondDuration { start_secs, duration });
        }
        if let Some(end_secs) = self.end {
            if end_secs > duration + END_TOLERANCE_SECS {
                return Err(TimestampError::EndBeyondDuration { end_secs, duration });
            }
        }
        Ok(())
    }

    /// Filename marker identifying a trimmed download, e.g. `_trim_00-01-00_00-02-00`.
    pub fn marker(&self) -> String {
        let start = format_seconds(self.start_secs());
        let end = self
            .end
            .map(format_seconds)
            .unwrap_or_else(|| "end".to_string());
        format!("_trim_{}_{}", start, end).replace([':', '.'], "-")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_hh_mm_ss() {
        assert_eq!(parse_timestamp("00:00:00").unwrap(), 0.0);
        assert_eq!(parse_timestamp("00:01:00").unwrap(), 60.0);
        assert_eq!(parse_timestamp("01:30:45").unwrap(), 5445.0);
    }

    #[test]
    fn test_parse_timestamp_short_forms() {
        assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
        assert_eq!(parse_timestamp("90").unwrap(), 90.0);
        let fractional = parse_timestamp("00:00:30.500").unwrap();
        assert!((fractional - 30.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_timestamp_errors() {
        assert_eq!(parse_timestamp(""), Err(TimestampError::Empty));
        assert_eq!(parse_timestamp("  "), Err(TimestampError::Empty));
        assert!(matches!(parse_timestamp("abc"), Err(TimestampError::InvalidValue(_, _))));
        assert!(matches!(parse_timestamp("1:2:3:4"), Err(TimestampError::InvalidFormat(_))));
        assert_eq!(parse_timestamp("-5"), Err(TimestampError::Negative));
        assert!(matches!(parse_timestamp("inf"), Err(TimestampError::InvalidValue(_, _))));
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(3661.0), "01:01:01");
        assert_eq!(format_seconds(30.5), "00:00:30.500");
    }

    #[test]
    fn test_format_seconds_carries_rounding() {
        assert_eq!(format_seconds(59.9999), "00:01:00");
        assert_eq!(format_seconds(3599.9999), "01:00:00");
        assert_eq!(format_seconds(59.9994), "00:00:59.999");
        assert_eq!(format_seconds(-1.0), "00:00:00");
    }

    #[test]
    fn test_trim_range_absent() {
        assert_eq!(TrimRange::from_bounds(None, None).unwrap(), None);
        assert_eq!(TrimRange::from_bounds(Some(""), Some(" ")).unwrap(), None);
    }

    #[test]
    fn test_trim_range_both_bounds() {
        let range = TrimRange::from_bounds(Some("00:01:00"), Some("00:02:00"))
            .unwrap()
            .unwrap();
        assert_eq!(range.start_secs(), 60.0);
        assert_eq!(range.end_secs(), Some(120.0));
        assert_eq!(range.length_secs(), Some(60.0));
        assert_eq!(range.marker(), "_trim_00-01-00_00-02-00");
    }

    #[test]
    fn test_trim_range_open_bounds() {
        let from = TrimRange::from_bounds(Some("30"), None).unwrap().unwrap();
        assert_eq!(from.length_secs(), None);
        assert_eq!(from.marker(), "_trim_00-00-30_end");

        let until = TrimRange::from_bounds(None, Some("45")).unwrap().unwrap();
        assert_eq!(until.start_secs(), 0.0);
        assert_eq!(until.length_secs(), Some(45.0));
    }

    #[test]
    fn test_trim_range_start_after_end() {
        assert_eq!(
            TrimRange::from_bounds(Some("00:02:00"), Some("00:01:00")),
            Err(TimestampError::StartNotBeforeEnd)
        );
        assert_eq!(
            TrimRange::from_bounds(Some("60"), Some("60")),
            Err(TimestampError::StartNotBeforeEnd)
        );
    }

    #[test]
    fn test_trim_range_against_duration() {
        let range = TrimRange::from_bounds(Some("00:01:00"), Some("00:02:00"))
            .unwrap()
            .unwrap();
        assert!(range.check_against(600.0).is_ok());
        assert!(range.check_against(119.5).is_ok());
        assert!(matches!(
            range.check_against(100.0),
            Err(TimestampError::EndBeyondDuration { .. })
        ));
        assert!(matches!(
            range.check_against(60.0),
            Err(TimestampError::StartBeyondDuration { .. })
        ));
    }
}
