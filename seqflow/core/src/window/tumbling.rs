//! Tumbling time window

use std::time::Duration;

use futures::{Stream, StreamExt};

use super::ticked::ticked_windows;
use super::TimedBuffer;
use crate::signal::CancelToken;
use crate::FlowStream;

/// Batch elements into consecutive, non-overlapping windows of `size`
///
/// Every `size` the elements gathered since the previous cut are emitted as
/// one batch; empty batches are skipped. When the source ends the partial
/// batch is flushed. Concatenating every batch reproduces the source. A zero
/// `size` yields an empty stream.
pub fn tumbling_time_window<S, T>(source: S, size: Duration) -> FlowStream<Vec<T>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    tumbling_time_window_ctx(&CancelToken::never(), source, size)
}

/// [`tumbling_time_window`] that flushes its partial batch and ends when
/// `token` fires
pub fn tumbling_time_window_ctx<S, T>(
    token: &CancelToken,
    source: S,
    size: Duration,
) -> FlowStream<Vec<T>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    if size.is_zero() {
        return futures::stream::empty().boxed();
    }
    ticked_windows(token.clone(), source, size, TimedBuffer::take)
}
