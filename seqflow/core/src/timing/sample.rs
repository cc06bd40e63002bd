//! Sample
//!
//! A background feeder keeps overwriting a single "latest" slot; the ticker
//! side takes whatever is in the slot on every tick. Values overwritten
//! between two ticks are dropped.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;

use super::clock::{ticker, Wake};
use crate::signal::{feed, CancelToken, DoneSignal, TaskGroup};
use crate::FlowStream;

/// Emit the most recent element once per `interval`, if a new one arrived
///
/// When the source ends, a final element that no tick picked up yet is
/// flushed. A zero `interval` returns the source unchanged.
pub fn sample<S, T>(source: S, interval: Duration) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    sample_ctx(&CancelToken::never(), source, interval)
}

/// [`sample`] that ends as soon as `token` fires, without a final flush
pub fn sample_ctx<S, T>(token: &CancelToken, source: S, interval: Duration) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    if interval.is_zero() {
        return source.boxed();
    }

    let token = token.clone();
    stream! {
        let latest: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
        let exhausted = DoneSignal::new();
        let mut group = TaskGroup::new();
        group.watch(&token);
        let done = group.done().clone();
        {
            let latest = Arc::clone(&latest);
            group.spawn(feed(source, done.clone(), exhausted.clone(), move |value| {
                *latest.lock() = Some(value);
            }));
        }

        let mut ticks = ticker(interval);
        loop {
            let wake = tokio::select! {
                biased;
                () = done.closed() => Wake::Cancelled,
                () = exhausted.closed() => Wake::Exhausted,
                _ = ticks.tick() => Wake::Timer,
            };
            match wake {
                Wake::Timer => {
                    let value = latest.lock().take();
                    if let Some(value) = value {
                        yield value;
                    }
                }
                Wake::Exhausted => {
                    // The feeder has finished, so the slot is final
                    group.shutdown().await;
                    let last = latest.lock().take();
                    if let Some(value) = last {
                        tracing::trace!("sample flushing final element");
                        yield value;
                    }
                    return;
                }
                Wake::Cancelled | Wake::Item(()) => break,
            }
        }
        group.shutdown().await;
    }
    .boxed()
}
