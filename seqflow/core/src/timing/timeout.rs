//! Timeout
//!
//! Turns silence into in-band failures. The deadline restarts whenever the
//! consumer comes back for the next element and after every failure, so a
//! stalled source produces one `DeadlineExceeded` per `duration` for as long
//! as it stays stalled.

use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};

use super::clock::{RearmableTimer, Wake};
use crate::error::FlowError;
use crate::signal::CancelToken;
use crate::FlowStream;

/// Wrap each element in `Ok`, inserting `Err(DeadlineExceeded)` whenever
/// `duration` passes without one
///
/// The stream ends when the source does.
pub fn timeout<S, T>(source: S, duration: Duration) -> FlowStream<Result<T, FlowError>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    timeout_ctx(&CancelToken::never(), source, duration)
}

/// [`timeout`] that emits the token's error once and ends when `token` fires
pub fn timeout_ctx<S, T>(
    token: &CancelToken,
    source: S,
    duration: Duration,
) -> FlowStream<Result<T, FlowError>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    let token = token.clone();
    stream! {
        futures::pin_mut!(source);
        let mut timer = RearmableTimer::new();
        timer.arm(duration);
        loop {
            let wake = tokio::select! {
                biased;
                () = token.cancelled() => Wake::Cancelled,
                item = source.next() => Wake::from_next(item),
                () = timer.fired() => Wake::Timer,
            };
            match wake {
                Wake::Item(value) => {
                    yield Ok(value);
                }
                Wake::Timer => {
                    tracing::trace!(?duration, "timeout deadline passed");
                    yield Err(FlowError::DeadlineExceeded);
                }
                Wake::Cancelled => {
                    yield Err(token.error().unwrap_or(FlowError::Cancelled));
                    break;
                }
                Wake::Exhausted => break,
            }
            timer.arm(duration);
        }
    }
    .boxed()
}
