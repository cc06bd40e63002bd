//! Prefetch
//!
//! Decouples a producer from its consumer: a background task pulls up to `n`
//! elements ahead into a bounded queue.

use async_stream::stream;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::signal::TaskGroup;
use crate::FlowStream;

/// Pull up to `n` elements ahead of the consumer
///
/// `n == 0` returns the source unchanged (boxed).
pub fn prefetch<S, T>(source: S, n: usize) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    if n == 0 {
        return source.boxed();
    }

    stream! {
        let (tx, rx) = mpsc::channel::<T>(n);
        let mut group = TaskGroup::new();
        let done = group.done().clone();
        group.spawn(async move {
            futures::pin_mut!(source);
            loop {
                let next = tokio::select! {
                    biased;
                    () = done.closed() => None,
                    item = source.next() => item,
                };
                let Some(value) = next else { break };
                let sent = tokio::select! {
                    biased;
                    () = done.closed() => false,
                    sent = tx.send(value) => sent.is_ok(),
                };
                if !sent {
                    break;
                }
            }
        });

        let mut ahead = ReceiverStream::new(rx);
        while let Some(value) = ahead.next().await {
            yield value;
        }
        group.shutdown().await;
    }
    .boxed()
}
