//! Session window
//!
//! A single loop owns the session buffer and one inactivity timer. Each
//! arrival re-arms the timer with a fresh deadline; when it fires, the
//! session closes.

use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};

use super::TimedBuffer;
use crate::signal::CancelToken;
use crate::timing::clock::{RearmableTimer, Wake};
use crate::FlowStream;

/// Group elements into sessions separated by at least `gap` of inactivity
///
/// A non-empty session still open when the source ends is flushed.
pub fn session_window<S, T>(source: S, gap: Duration) -> FlowStream<Vec<T>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    session_window_ctx(&CancelToken::never(), source, gap)
}

/// [`session_window`] that flushes the open session and ends when `token`
/// fires
pub fn session_window_ctx<S, T>(token: &CancelToken, source: S, gap: Duration) -> FlowStream<Vec<T>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    let token = token.clone();
    stream! {
        futures::pin_mut!(source);
        let mut session = TimedBuffer::new();
        let mut timer = RearmableTimer::new();
        loop {
            let wake = tokio::select! {
                biased;
                () = token.cancelled() => Wake::Cancelled,
                () = timer.fired() => Wake::Timer,
                item = source.next() => Wake::from_next(item),
            };
            match wake {
                Wake::Item(value) => {
                    session.push(value);
                    timer.arm(gap);
                }
                Wake::Timer => {
                    let closed = session.take();
                    if !closed.is_empty() {
                        tracing::trace!(len = closed.len(), "session gap elapsed");
                        yield closed;
                    }
                }
                Wake::Exhausted | Wake::Cancelled => {
                    timer.disarm();
                    let open = session.take();
                    if !open.is_empty() {
                        yield open;
                    }
                    break;
                }
            }
        }
    }
    .boxed()
}
