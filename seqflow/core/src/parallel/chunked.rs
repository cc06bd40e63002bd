//! Chunked Orderer
//!
//! Bounded-memory ordered mode. The source is consumed in fixed batches of
//! `chunk_size` elements; every slot of a batch is dispatched to its own task,
//! with a semaphore of width `concurrency` bounding how many run at once, and
//! the batch is released in slot order only after all of its slots resolved.
//! At most `chunk_size` results ever wait for emission. The price is that
//! workers go idle at each batch boundary.

use std::future::Future;
use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::ParallelConfig;
use crate::signal::{CancelToken, DoneSignal, TaskGroup};
use crate::FlowStream;

/// A batch of pulled elements awaiting dispatch
#[derive(Debug)]
pub(crate) struct Chunk<T> {
    values: Vec<T>,
    capacity: usize,
}

impl<T: Send + 'static> Chunk<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, value: T) {
        debug_assert!(!self.is_full());
        self.values.push(value);
    }

    pub(crate) fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    /// Run `f` over every slot and collect the results in slot order
    ///
    /// Returns `None` if the pipeline shut down before every slot resolved.
    pub(crate) async fn resolve<F, Fut, R>(
        self,
        f: &Arc<F>,
        permits: &Arc<Semaphore>,
        done: &DoneSignal,
    ) -> Option<Vec<R>>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None)
            .take(self.values.len())
            .collect();

        let mut tasks = JoinSet::new();
        for (slot, value) in self.values.into_iter().enumerate() {
            let f = Arc::clone(f);
            let permits = Arc::clone(permits);
            let done = done.clone();
            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    () = done.closed() => None,
                    permit = permits.acquire_owned() => permit.ok(),
                };
                let _permit = permit?;
                tokio::select! {
                    biased;
                    () = done.closed() => None,
                    result = f(value) => Some((slot, result)),
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some((slot, result))) => slots[slot] = Some(result),
                Ok(None) => {}
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(_) => {}
            }
        }

        slots.into_iter().collect()
    }
}

/// Ordered parallel application of `f` with chunk-bounded reordering
pub(crate) fn chunked<S, T, F, Fut, R>(
    source: S,
    config: ParallelConfig,
    token: CancelToken,
    f: F,
) -> FlowStream<R>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    stream! {
        let chunk_size = config.chunk_size().max(1);
        let f = Arc::new(f);
        let permits = Arc::new(Semaphore::new(config.concurrency()));
        let mut group = TaskGroup::new();
        group.watch(&token);
        let done = group.done().clone();

        tracing::debug!(
            concurrency = config.concurrency(),
            chunk_size,
            "starting chunked orderer"
        );

        futures::pin_mut!(source);
        let mut batches = 0u64;
        loop {
            let mut chunk = Chunk::with_capacity(chunk_size);
            let mut exhausted = false;
            while !chunk.is_full() {
                let next = tokio::select! {
                    biased;
                    () = done.closed() => None,
                    item = source.next() => Some(item),
                };
                match next {
                    Some(Some(value)) => chunk.push(value),
                    Some(None) => {
                        exhausted = true;
                        break;
                    }
                    None => break,
                }
            }
            if chunk.is_empty() || done.is_closed() {
                break;
            }

            tracing::trace!(batch = batches, len = chunk.len(), "dispatching chunk");
            let Some(results) = chunk.resolve(&f, &permits, &done).await else {
                break;
            };
            batches += 1;

            for result in results {
                yield result;
            }
            if exhausted {
                break;
            }
        }

        group.shutdown().await;
    }
    .boxed()
}
