//! Delay

use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};

use super::clock::pause;
use crate::signal::CancelToken;
use crate::FlowStream;

/// Sleep `duration` before emitting each element
pub fn delay<S, T>(source: S, duration: Duration) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    delay_ctx(&CancelToken::never(), source, duration)
}

/// [`delay`] that ends as soon as `token` fires, including mid-sleep
pub fn delay_ctx<S, T>(token: &CancelToken, source: S, duration: Duration) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    let token = token.clone();
    stream! {
        futures::pin_mut!(source);
        loop {
            let next = tokio::select! {
                biased;
                () = token.cancelled() => None,
                item = source.next() => item,
            };
            let Some(value) = next else { break };
            if pause(&token, duration).await.is_err() {
                break;
            }
            yield value;
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_delay_each_element() {
        let start = Instant::now();
        let out: Vec<i32> = delay(futures::stream::iter([1, 2, 3]), Duration::from_millis(10))
            .collect()
            .await;
        assert_eq!(out, vec![1, 2, 3]);
        assert_eq!(start.elapsed(), Duration::from_millis(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_ctx_cancel_mid_sleep() {
        let token = CancelToken::new();
        let mut delayed = delay_ctx(&token, futures::stream::iter([1, 2]), Duration::from_secs(3600));
        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                token.cancel();
            })
        };
        assert_eq!(delayed.next().await, None);
        canceller.await.expect("canceller");
    }
}
