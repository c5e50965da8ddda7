//! Partial-content responses for video files.
//!
//! Every response is a 206 carrying exactly one planned [`RangeWindow`]. The
//! file handle lives inside the response body, so it is closed whenever the
//! body is dropped: after the last byte, on a read error, or when hyper drops
//! the body because the client went away.

use std::io;
use std::io::SeekFrom;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::Stream;
use reelmark_common::{Error, Result, VideoRef};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::locator::LocatedVideo;
use super::range::RangeWindow;

/// How a body stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Still being polled.
    Streaming,
    /// Every planned byte was produced.
    Completed,
    /// The file ended before the window did (it shrank after the stat).
    Truncated,
    /// A read failed; the stream was terminated.
    Failed,
}

/// Body stream that tracks progress and logs how it ended.
///
/// Dropping it before it finished means the peer disconnected; that is
/// logged at debug level and is not an error.
pub struct GuardedStream<S> {
    inner: S,
    video: VideoRef,
    expected: u64,
    sent: u64,
    outcome: StreamOutcome,
}

impl<S> GuardedStream<S> {
    pub fn new(inner: S, video: VideoRef, expected: u64) -> Self {
        Self {
            inner,
            video,
            expected,
            sent: 0,
            outcome: StreamOutcome::Streaming,
        }
    }

    pub fn bytes_sent(&self) -> u64 {
        self.sent
    }

    pub fn outcome(&self) -> StreamOutcome {
        self.outcome
    }
}

impl<S> Stream for GuardedStream<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.outcome != StreamOutcome::Streaming {
            return Poll::Ready(None);
        }

        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(
                    video = %this.video,
                    sent = this.sent,
                    expected = this.expected,
                    error = %e,
                    "Stream read failed, terminating response"
                );
                this.outcome = StreamOutcome::Failed;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                if this.sent < this.expected {
                    tracing::warn!(
                        video = %this.video,
                        sent = this.sent,
                        expected = this.expected,
                        "File ended before the planned window"
                    );
                    this.outcome = StreamOutcome::Truncated;
                } else {
                    this.outcome = StreamOutcome::Completed;
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S> Drop for GuardedStream<S> {
    fn drop(&mut self) {
        if self.outcome == StreamOutcome::Streaming {
            tracing::debug!(
                video = %self.video,
                sent = self.sent,
                expected = self.expected,
                "Client closed stream early"
            );
        }
    }
}

/// Open `located` at the window start and stream exactly the window.
pub async fn open_window(
    located: &LocatedVideo,
    window: RangeWindow,
) -> Result<GuardedStream<ReaderStream<tokio::io::Take<File>>>> {
    let mut file = match File::open(&located.path).await {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::not_found("video file", located.path.display()));
        }
        Err(e) => return Err(Error::Io { source: e }),
    };

    file.seek(SeekFrom::Start(window.start)).await?;

    Ok(GuardedStream::new(
        ReaderStream::new(file.take(window.content_length)),
        located.asset.video_ref(),
        window.content_length,
    ))
}

/// Build the 206 response for one window of a located video.
pub async fn partial_response(
    located: &LocatedVideo,
    window: RangeWindow,
    content_type: &str,
) -> Result<Response> {
    let stream = open_window(located, window).await?;

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_RANGE, window.content_range(located.size_bytes))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, window.content_length.to_string())
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from_stream(stream))
        .map_err(|e| Error::internal(format!("Failed to build response: {e}")))
}
