use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::response::{IntoResponse, Response};
use bytes::{Buf, Bytes};
use futures::Stream;
use http_body::{Body, Frame, SizeHint};
use pin_project::pin_project;

/// Re-emits the bytes `start..=end` of a sequential chunk stream.
///
/// Bytes before `start` are skipped, slicing the chunk that straddles the
/// boundary. Once the chunk containing `end` has been seen the upstream is
/// dropped, so a large or endless source is never drained past the window.
/// With `end == None` everything from `start` to the end of the source is
/// passed through.
///
/// Implements [`Stream`], [`Body`], and [`IntoResponse`].
#[pin_project]
pub struct ByteWindow<S> {
    start: u64,
    end: Option<u64>,
    consumed: u64,
    #[pin]
    upstream: Option<S>,
}

impl<S> ByteWindow<S> {
    pub fn new(upstream: S, start: u64, end: Option<u64>) -> Self {
        ByteWindow { start, end, consumed: 0, upstream: Some(upstream) }
    }

    /// Bytes pulled from the upstream so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Whether the upstream has been released, either because the window
    /// is complete or because the upstream ended or failed.
    pub fn is_finished(&self) -> bool {
        self.upstream.is_none()
    }
}

impl<S, E> Stream for ByteWindow<S>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            let Some(upstream) = this.upstream.as_mut().as_pin_mut() else {
                return Poll::Ready(None);
            };

            let mut chunk = match ready!(upstream.poll_next(cx)) {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    this.upstream.set(None);
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    this.upstream.set(None);
                    return Poll::Ready(None);
                }
            };

            let chunk_start = *this.consumed;
            *this.consumed += chunk.len() as u64;

            if *this.consumed <= *this.start {
                continue;
            }

            let window_start = u64::max(chunk_start, *this.start);
            if chunk_start < *this.start {
                // start falls inside this chunk
                chunk.advance((*this.start - chunk_start) as usize);
            }

            if let Some(end) = *this.end {
                let end_exclusive = end.saturating_add(1);
                if *this.consumed >= end_exclusive {
                    chunk.truncate(end_exclusive.saturating_sub(window_start) as usize);
                    tracing::trace!(consumed = *this.consumed, "byte window satisfied, releasing upstream");
                    this.upstream.set(None);
                }
            }

            if !chunk.is_empty() {
                return Poll::Ready(Some(Ok(chunk)));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.upstream {
            None => (0, Some(0)),
            Some(upstream) => (0, upstream.size_hint().1),
        }
    }
}

impl<S, E> Body for ByteWindow<S>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    type Data = Bytes;
    type Error = E;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>)
        -> Poll<Option<Result<Frame<Bytes>, E>>>
    {
        self.poll_next(cx).map(|item| item.map(|result| result.map(Frame::data)))
    }

    fn is_end_stream(&self) -> bool {
        self.upstream.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        let mut hint = SizeHint::new();
        if let Some(end) = self.end {
            let emitted = self.consumed.saturating_sub(self.start);
            let window = end.saturating_add(1).saturating_sub(self.start);
            hint.set_upper(window.saturating_sub(emitted));
        }
        if self.upstream.is_none() {
            hint.set_exact(0);
        }
        hint
    }
}

impl<S, E> IntoResponse for ByteWindow<S>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<axum::BoxError> + 'static,
{
    fn into_response(self) -> Response {
        Response::new(axum::body::Body::new(self))
    }
}
