//! Provider chunk stream → HTTP body stream
//!
//! [`Relay`] wraps the provider's chunk stream and yields the text of each
//! chunk's first candidate part as [`Bytes`]:
//! - chunks without candidates, parts or text are skipped
//! - the output ends when the upstream ends
//! - the first upstream error is yielded once and then the output ends
//!
//! The upstream is only polled when the consumer polls the relay, so nothing
//! is read ahead of what the HTTP body has accepted.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::Stream;
use tracing::{Span, debug, error, warn};

use crate::error::{RelayError, Result};
use crate::provider::GenerateContentResponse;

/// Stream adapter forwarding chunk text
pub struct Relay<S> {
    inner: S,
    span: Span,
    finished: bool,
    forwarded: usize,
    forwarded_bytes: usize,
    skipped: usize,
}

impl<S> Relay<S>
where
    S: Stream<Item = Result<GenerateContentResponse>> + Unpin,
{
    /// Wrap an upstream. Log lines are emitted inside the span that is
    /// current at construction time.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            span: Span::current(),
            finished: false,
            forwarded: 0,
            forwarded_bytes: 0,
            skipped: 0,
        }
    }

    /// Number of text units forwarded so far
    pub fn forwarded(&self) -> usize {
        self.forwarded
    }

    /// Number of chunks that carried no text
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<S> Stream for Relay<S>
where
    S: Stream<Item = Result<GenerateContentResponse>> + Unpin,
{
    type Item = std::result::Result<Bytes, RelayError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.finished {
            return Poll::Ready(None);
        }

        let _entered = this.span.enter();

        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    if let Some(reason) = chunk.block_reason() {
                        warn!(block_reason = reason, "Provider blocked the prompt");
                    }

                    match chunk.into_first_text() {
                        Some(text) => {
                            this.forwarded += 1;
                            this.forwarded_bytes += text.len();
                            return Poll::Ready(Some(Ok(Bytes::from(text))));
                        }
                        None => {
                            this.skipped += 1;
                            continue;
                        }
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    error!(
                        error_type = e.category(),
                        error_message = %e,
                        forwarded = this.forwarded,
                        forwarded_bytes = this.forwarded_bytes,
                        "Provider stream failed, aborting response"
                    );
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    debug!(
                        forwarded = this.forwarded,
                        forwarded_bytes = this.forwarded_bytes,
                        skipped = this.skipped,
                        "Provider stream completed"
                    );
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Relay the text of a provider chunk stream
pub fn relay<S>(upstream: S) -> Relay<S>
where
    S: Stream<Item = Result<GenerateContentResponse>> + Unpin,
{
    Relay::new(upstream)
}
