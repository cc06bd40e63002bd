//! Debounce

use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};

use super::clock::{RearmableTimer, Wake};
use crate::signal::CancelToken;
use crate::FlowStream;

/// Emit an element only once `quiet` has passed without a newer one
///
/// Every arrival replaces the pending element and restarts the quiet timer.
/// When the source ends with an element still pending, it is flushed before
/// the stream ends. If the quiet timer and source exhaustion become ready at
/// the same moment, which one is observed first is unspecified; the pending
/// element is emitted exactly once either way.
pub fn debounce<S, T>(source: S, quiet: Duration) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    debounce_ctx(&CancelToken::never(), source, quiet)
}

/// [`debounce`] that ends as soon as `token` fires
///
/// An element still pending at cancellation is discarded.
pub fn debounce_ctx<S, T>(token: &CancelToken, source: S, quiet: Duration) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    let token = token.clone();
    stream! {
        futures::pin_mut!(source);
        let mut timer = RearmableTimer::new();
        let mut pending: Option<T> = None;
        loop {
            let wake = tokio::select! {
                () = token.cancelled() => Wake::Cancelled,
                item = source.next() => Wake::from_next(item),
                () = timer.fired() => Wake::Timer,
            };
            match wake {
                Wake::Item(value) => {
                    pending = Some(value);
                    timer.arm(quiet);
                }
                Wake::Timer => {
                    if let Some(value) = pending.take() {
                        yield value;
                    }
                }
                Wake::Exhausted => {
                    if let Some(value) = pending.take() {
                        tracing::trace!("debounce flushing pending element at exhaustion");
                        yield value;
                    }
                    break;
                }
                Wake::Cancelled => break,
            }
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    const MS: Duration = Duration::from_millis(1);

    /// Yields `(delay_before, value)` pairs
    fn scripted(script: Vec<(u64, i32)>) -> impl Stream<Item = i32> + Send + 'static {
        stream! {
            for (delay, value) in script {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                yield value;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_emits_last_of_each_burst() {
        let source = scripted(vec![(0, 1), (5, 2), (5, 3), (50, 4), (5, 5)]);
        let out: Vec<i32> = debounce(source, 20 * MS).collect().await;
        assert_eq!(out, vec![3, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_emits_after_quiet_period() {
        let source = scripted(vec![(0, 1), (100, 2)]);
        let mut debounced = debounce(source, 30 * MS);
        let start = Instant::now();
        assert_eq!(debounced.next().await, Some(1));
        assert_eq!(start.elapsed(), 30 * MS);
        assert_eq!(debounced.next().await, Some(2));
        assert_eq!(debounced.next().await, None);
    }

    #[tokio::test]
    async fn test_debounce_flushes_on_exhaustion() {
        let out: Vec<i32> = debounce(futures::stream::iter(1..=4), Duration::from_secs(60))
            .collect()
            .await;
        assert_eq!(out, vec![4]);
    }

    #[tokio::test]
    async fn test_debounce_empty_source() {
        let out: Vec<i32> = debounce(futures::stream::empty::<i32>(), MS).collect().await;
        assert!(out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_ctx_discards_pending_on_cancel() {
        let token = CancelToken::new();
        let source = futures::stream::iter([1]).chain(futures::stream::pending());
        let mut debounced = debounce_ctx(&token, source, Duration::from_secs(60));

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(10 * MS).await;
                token.cancel();
            })
        };
        assert_eq!(debounced.next().await, None);
        canceller.await.expect("canceller");
    }
}
