//! Time-based generators

use std::time::Duration;

use async_stream::stream;
use futures::StreamExt;

use super::clock::{pause, ticker};
use crate::signal::CancelToken;
use crate::FlowStream;

/// Emit `0, 1, 2, ...`, one value per `period`, forever
///
/// The first value arrives one `period` after the first poll. A zero
/// `period` yields an empty stream.
pub fn interval(period: Duration) -> FlowStream<u64> {
    interval_ctx(&CancelToken::never(), period)
}

/// [`interval`] that ends as soon as `token` fires
pub fn interval_ctx(token: &CancelToken, period: Duration) -> FlowStream<u64> {
    if period.is_zero() {
        return futures::stream::empty().boxed();
    }

    let token = token.clone();
    stream! {
        let mut ticks = ticker(period);
        let mut count = 0u64;
        loop {
            let ticked = tokio::select! {
                biased;
                () = token.cancelled() => false,
                _ = ticks.tick() => true,
            };
            if !ticked {
                break;
            }
            yield count;
            count += 1;
        }
    }
    .boxed()
}

/// Emit `value` once after `duration`
pub fn timer<T>(duration: Duration, value: T) -> FlowStream<T>
where
    T: Send + 'static,
{
    timer_ctx(&CancelToken::never(), duration, value)
}

/// [`timer`] that ends without emitting if `token` fires first
pub fn timer_ctx<T>(token: &CancelToken, duration: Duration, value: T) -> FlowStream<T>
where
    T: Send + 'static,
{
    let token = token.clone();
    stream! {
        if pause(&token, duration).await.is_ok() {
            yield value;
        }
    }
    .boxed()
}
