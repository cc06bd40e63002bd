//! Rate limiting and throttling
//!
//! Both operators only ever delay elements, never drop them.

use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tokio::time::Instant;

use super::bucket::TokenBucket;
use super::clock::pause;
use crate::signal::CancelToken;
use crate::FlowStream;

/// Emit at most `n` elements per `per`, after an initial burst of `n`
///
/// `n == 0` yields an empty stream.
pub fn rate_limit<S, T>(source: S, n: u32, per: Duration) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    rate_limit_ctx(&CancelToken::never(), source, n, per)
}

/// [`rate_limit`] that ends as soon as `token` fires, including mid-wait
pub fn rate_limit_ctx<S, T>(token: &CancelToken, source: S, n: u32, per: Duration) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    if n == 0 {
        tracing::debug!("rate limit of zero per period, yielding nothing");
        return futures::stream::empty().boxed();
    }

    let token = token.clone();
    stream! {
        let Some(mut bucket) = TokenBucket::new(n, per) else {
            return;
        };
        futures::pin_mut!(source);
        loop {
            let next = tokio::select! {
                biased;
                () = token.cancelled() => None,
                item = source.next() => item,
            };
            let Some(value) = next else { break };
            if bucket.acquire(&token).await.is_err() {
                break;
            }
            yield value;
        }
    }
    .boxed()
}

/// Keep at least `interval` between consecutive emissions
pub fn throttle<S, T>(source: S, interval: Duration) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    throttle_ctx(&CancelToken::never(), source, interval)
}

/// [`throttle`] that ends as soon as `token` fires, including mid-wait
pub fn throttle_ctx<S, T>(token: &CancelToken, source: S, interval: Duration) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    let token = token.clone();
    stream! {
        futures::pin_mut!(source);
        let mut last_emit: Option<Instant> = None;
        loop {
            let next = tokio::select! {
                biased;
                () = token.cancelled() => None,
                item = source.next() => item,
            };
            let Some(value) = next else { break };

            if let Some(previous) = last_emit {
                let remaining = interval.saturating_sub(previous.elapsed());
                if !remaining.is_zero() && pause(&token, remaining).await.is_err() {
                    break;
                }
            }
            last_emit = Some(Instant::now());
            yield value;
        }
    }
    .boxed()
}
