//! Ticker-driven window driver shared by the tumbling and sliding windows
//!
//! ```text
//!  source ──► feeder ──push──► Arc<Mutex<TimedBuffer>> ◄──cut── ticker loop ──► Vec<T>
//! ```
//!
//! On exhaustion or cancellation the feeder is joined first, so the final cut
//! sees every element the feeder ever pulled.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;

use super::TimedBuffer;
use crate::signal::{feed, CancelToken, DoneSignal, TaskGroup};
use crate::timing::clock::{ticker, Wake};
use crate::FlowStream;

/// Emit `cut(buffer)` every `period`, and once more at the end
///
/// Empty windows are skipped.
pub(crate) fn ticked_windows<S, T, C>(
    token: CancelToken,
    source: S,
    period: Duration,
    mut cut: C,
) -> FlowStream<Vec<T>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    C: FnMut(&mut TimedBuffer<T>) -> Vec<T> + Send + 'static,
{
    stream! {
        let buffer = Arc::new(Mutex::new(TimedBuffer::new()));
        let exhausted = DoneSignal::new();
        let mut group = TaskGroup::new();
        group.watch(&token);
        let done = group.done().clone();
        {
            let buffer = Arc::clone(&buffer);
            group.spawn(feed(source, done.clone(), exhausted.clone(), move |value| {
                buffer.lock().push(value);
            }));
        }

        let mut ticks = ticker(period);
        let mut windows = 0u64;
        let ended_by = loop {
            let wake: Wake<()> = tokio::select! {
                biased;
                () = done.closed() => Wake::Cancelled,
                () = exhausted.closed() => Wake::Exhausted,
                _ = ticks.tick() => Wake::Timer,
            };
            if !matches!(wake, Wake::Timer) {
                break wake;
            }
            let window = cut(&mut *buffer.lock());
            if !window.is_empty() {
                windows += 1;
                yield window;
            }
        };

        group.shutdown().await;
        let last = cut(&mut *buffer.lock());
        tracing::debug!(
            windows,
            remaining = last.len(),
            cancelled = matches!(ended_by, Wake::Cancelled),
            "window stream finishing"
        );
        if !last.is_empty() {
            yield last;
        }
    }
    .boxed()
}
