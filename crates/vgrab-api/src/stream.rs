//! Download response body that releases its scratch directory.
//!
//! [`CleanupStream`] owns the open file and the request's [`ScratchDir`].
//! The directory is removed as soon as the file has been sent, when reading
//! fails, or when the body is dropped early because the client went away.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Bytes;
use futures_util::Stream;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use vgrab_media::{RetrievalStage, ScratchDir, StageTracker};

use crate::metrics;

/// Streams a file once, then removes its scratch directory.
pub struct CleanupStream {
    inner: Option<ReaderStream<File>>,
    scratch: Option<ScratchDir>,
    tracker: StageTracker,
    mode: &'static str,
    sent: u64,
    expected: u64,
}

impl CleanupStream {
    pub fn new(file: File, scratch: ScratchDir, tracker: StageTracker, mode: &'static str, expected: u64) -> Self {
        Self {
            inner: Some(ReaderStream::new(file)),
            scratch: Some(scratch),
            tracker,
            mode,
            sent: 0,
            expected,
        }
    }

    /// Close the file and remove the scratch directory.
    ///
    /// Runs inline on the polling task. The directory holds only the streamed
    /// file at this point, and it must be gone by the time the body reports
    /// its end.
    fn release(&mut self) {
        self.inner = None;
        if let Some(scratch) = self.scratch.take() {
            if let Err(e) = scratch.close() {
                warn!(
                    request_id = %self.tracker.request_id(),
                    error = %e,
                    "Failed to remove scratch directory"
                );
            }
        }
        metrics::record_bytes_streamed(self.mode, self.sent);
    }

    fn complete(&mut self) {
        self.release();
        self.tracker.advance(RetrievalStage::Cleaned);
        info!(
            request_id = %self.tracker.request_id(),
            size_bytes = self.sent,
            duration_ms = self.tracker.elapsed_ms(),
            "Download streamed"
        );
    }

    fn abort(&mut self, reason: &'static str, error: &dyn std::fmt::Display) {
        self.release();
        metrics::record_stream_aborted(self.mode, reason);
        warn!(
            request_id = %self.tracker.request_id(),
            sent_bytes = self.sent,
            expected_bytes = self.expected,
            reason,
            "Download stream ended early"
        );
        self.tracker.fail(error);
    }
}

impl Stream for CleanupStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match Pin::new(inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.abort("read_error", &e);
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.complete();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for CleanupStream {
    fn drop(&mut self) {
        if self.scratch.is_some() {
            self.abort("client_disconnected", &"response body dropped before completion");
        }
    }
}
