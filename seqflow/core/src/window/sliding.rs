//! Sliding time window

use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::time::Instant;

use super::ticked::ticked_windows;
use super::TimedBuffer;
use crate::signal::CancelToken;
use crate::FlowStream;

/// Every `slide`, emit the elements that arrived within the last `size`
///
/// Windows overlap when `slide < size`, so an element can appear in several
/// of them; that is why `T: Clone`. Elements are evicted once they are more
/// than `size` old. Empty windows are skipped, and the surviving elements
/// are flushed once more when the source ends. A zero `size` or `slide`
/// yields an empty stream.
pub fn sliding_time_window<S, T>(source: S, size: Duration, slide: Duration) -> FlowStream<Vec<T>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Clone + Send + 'static,
{
    sliding_time_window_ctx(&CancelToken::never(), source, size, slide)
}

/// [`sliding_time_window`] that flushes the current window and ends when
/// `token` fires
pub fn sliding_time_window_ctx<S, T>(
    token: &CancelToken,
    source: S,
    size: Duration,
    slide: Duration,
) -> FlowStream<Vec<T>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Clone + Send + 'static,
{
    if size.is_zero() || slide.is_zero() {
        return futures::stream::empty().boxed();
    }
    let cut = move |buffer: &mut TimedBuffer<T>| {
        buffer.evict_older_than(size, Instant::now());
        buffer.values()
    };
    ticked_windows(token.clone(), source, slide, cut)
}
