//! Retrieval lifecycle stages and structured stage logging.

use std::fmt;
use std::time::Instant;

use tracing::{info, warn, Span};

/// Stage of a single retrieval.
///
/// `Validating → FetchingMetadata → Downloading → [Trimming] → Streaming →
/// Cleaned`, with `Failed` reachable from any stage before `Cleaned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    Validating,
    FetchingMetadata,
    Downloading,
    Trimming,
    Streaming,
    Cleaned,
    Failed,
}

impl RetrievalStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalStage::Validating => "validating",
            RetrievalStage::FetchingMetadata => "fetching_metadata",
            RetrievalStage::Downloading => "downloading",
            RetrievalStage::Trimming => "trimming",
            RetrievalStage::Streaming => "streaming",
            RetrievalStage::Cleaned => "cleaned",
            RetrievalStage::Failed => "failed",
        }
    }

    /// Whether no further transition is allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RetrievalStage::Cleaned | RetrievalStage::Failed)
    }

    /// Whether `next` is a legal successor of this stage.
    pub fn can_advance_to(&self, next: RetrievalStage) -> bool {
        use RetrievalStage::*;
        match (self, next) {
            (Cleaned, _) | (Failed, _) => false,
            (_, Failed) => true,
            (Validating, FetchingMetadata)
            | (FetchingMetadata, Downloading)
            | (Downloading, Trimming)
            | (Downloading, Streaming)
            | (Trimming, Streaming)
            | (Streaming, Cleaned) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RetrievalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and logs the stage of one retrieval.
///
/// Every transition is logged with the request id, the stage left, the stage
/// entered and how long the previous stage took.
#[derive(Debug)]
pub struct StageTracker {
    request_id: String,
    stage: RetrievalStage,
    entered: Instant,
    started: Instant,
}

impl StageTracker {
    /// Start tracking in [`RetrievalStage::Validating`].
    pub fn new(request_id: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            request_id: request_id.into(),
            stage: RetrievalStage::Validating,
            entered: now,
            started: now,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn stage(&self) -> RetrievalStage {
        self.stage
    }

    /// Milliseconds since tracking began.
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Move to `next`, logging the transition.
    ///
    /// Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: RetrievalStage) {
        if !self.stage.can_advance_to(next) {
            warn!(
                request_id = %self.request_id,
                from = %self.stage,
                to = %next,
                "Ignoring illegal stage transition"
            );
            return;
        }

        let from = self.stage;
        let stage_ms = self.entered.elapsed().as_millis() as u64;
        self.stage = next;
        self.entered = Instant::now();

        info!(
            request_id = %self.request_id,
            from = %from,
            stage = %next,
            duration_ms = stage_ms,
            "Retrieval stage"
        );
    }

    /// Move to [`RetrievalStage::Failed`], logging the cause.
    pub fn fail(&mut self, error: &dyn fmt::Display) {
        if self.stage.is_terminal() {
            return;
        }
        warn!(
            request_id = %self.request_id,
            stage = %self.stage,
            duration_ms = self.elapsed_ms(),
            error = %error,
            "Retrieval failed"
        );
        self.stage = RetrievalStage::Failed;
        self.entered = Instant::now();
    }

    /// Tracing span carrying the request id.
    pub fn span(&self) -> Span {
        tracing::info_span!("retrieval", request_id = %self.request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RetrievalStage::*;

    #[test]
    fn test_happy_path_with_trim() {
        let mut tracker = StageTracker::new("req-1");
        for stage in [FetchingMetadata, Downloading, Trimming, Streaming, Cleaned] {
            tracker.advance(stage);
            assert_eq!(tracker.stage(), stage);
        }
        assert!(tracker.stage().is_terminal());
    }

    #[test]
    fn test_trimming_is_optional() {
        assert!(Downloading.can_advance_to(Streaming));
        assert!(Downloading.can_advance_to(Trimming));
        assert!(!FetchingMetadata.can_advance_to(Trimming));
    }

    #[test]
    fn test_illegal_transition_ignored() {
        let mut tracker = StageTracker::new("req-2");
        tracker.advance(Streaming);
        assert_eq!(tracker.stage(), Validating);
    }

    #[test]
    fn test_failed_from_any_stage() {
        for stage in [Validating, FetchingMetadata, Downloading, Trimming, Streaming] {
            assert!(stage.can_advance_to(Failed), "{stage} -> failed");
        }
        assert!(!Cleaned.can_advance_to(Failed));
    }

    #[test]
    fn test_fail_is_terminal() {
        let mut tracker = StageTracker::new("req-3");
        tracker.advance(FetchingMetadata);
        tracker.fail(&"yt-dlp failed");
        assert_eq!(tracker.stage(), Failed);
        tracker.advance(Downloading);
        assert_eq!(tracker.stage(), Failed);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(FetchingMetadata.to_string(), "fetching_metadata");
        assert_eq!(Cleaned.as_str(), "cleaned");
    }
}
