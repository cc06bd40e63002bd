//! Terminal operations
//!
//! Drive a parallel pipeline to completion and hand back a plain value. The
//! `_ctx` forms surface a fired token as an error; whatever was produced
//! before the token fired travels inside [`Partial`]. A token that fires
//! after every element was already delivered is not an error.

use std::future::{self, Future};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::{Stream, StreamExt};

use super::{parallel_map, parallel_map_ctx, ParallelConfig};
use crate::error::{FlowError, Partial};
use crate::signal::CancelToken;

/// Tracks how far a terminal's source got
#[derive(Debug, Default)]
struct Intake {
    pulled: AtomicUsize,
    exhausted: AtomicBool,
}

impl Intake {
    /// Wrap `source` so that every pull and the final end are recorded
    fn track<S>(self: &Arc<Self>, source: S) -> impl Stream<Item = S::Item> + Send + 'static
    where
        S: Stream + Send + 'static,
        S::Item: Send + 'static,
    {
        let counter = Arc::clone(self);
        let ended = Arc::clone(self);
        source
            .inspect(move |_| {
                counter.pulled.fetch_add(1, Ordering::Relaxed);
            })
            .chain(
                futures::stream::once(async move { ended.exhausted.store(true, Ordering::Release) })
                    .filter_map(|()| future::ready(None)),
            )
    }

    /// Whether the source ran dry and all `delivered` results made it out
    fn completed(&self, delivered: usize) -> bool {
        self.exhausted.load(Ordering::Acquire)
            && self.pulled.load(Ordering::Relaxed) == delivered
    }

    /// The token's error, unless the pipeline finished anyway
    fn outcome(&self, token: &CancelToken, delivered: usize) -> Option<FlowError> {
        if self.completed(delivered) {
            None
        } else {
            token.error()
        }
    }
}

/// Run `f` on every element for its side effects, in no particular order
pub async fn parallel_for_each<S, T, F, Fut>(source: S, f: F, config: ParallelConfig)
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut applied = parallel_map(source, f, config.with_ordered(false));
    while applied.next().await.is_some() {}
}

/// [`parallel_for_each`] that stops when `token` fires
///
/// # Errors
///
/// Returns the token's error if it fired before the pipeline finished.
pub async fn parallel_for_each_ctx<S, T, F, Fut>(
    token: &CancelToken,
    source: S,
    f: F,
    config: ParallelConfig,
) -> Result<(), FlowError>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let intake = Arc::new(Intake::default());
    let mut applied =
        parallel_map_ctx(token, intake.track(source), f, config.with_ordered(false));
    let mut delivered = 0;
    while applied.next().await.is_some() {
        delivered += 1;
    }
    intake.outcome(token, delivered).map_or(Ok(()), Err)
}

/// Map every element and gather the results
///
/// Order follows `config.ordered()`.
pub async fn parallel_collect<S, T, F, Fut, U>(source: S, f: F, config: ParallelConfig) -> Vec<U>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
    U: Send + 'static,
{
    parallel_map(source, f, config).collect().await
}

/// [`parallel_collect`] that stops when `token` fires
///
/// # Errors
///
/// Returns a [`Partial`] holding the results gathered before cancellation.
pub async fn parallel_collect_ctx<S, T, F, Fut, U>(
    token: &CancelToken,
    source: S,
    f: F,
    config: ParallelConfig,
) -> Result<Vec<U>, Partial<Vec<U>>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
    U: Send + 'static,
{
    let intake = Arc::new(Intake::default());
    let results: Vec<U> = parallel_map_ctx(token, intake.track(source), f, config)
        .collect()
        .await;
    match intake.outcome(token, results.len()) {
        Some(error) => Err(Partial::new(results, error)),
        None => Ok(results),
    }
}

/// Fold the sequence with `combine`, splitting the work across blocking
/// threads
///
/// The sequence is split into at most `concurrency` contiguous segments, each
/// folded on its own blocking thread, and the segment results are folded
/// left to right. `combine` must be associative or the result depends on the
/// split. Returns `None` for an empty sequence.
pub async fn parallel_reduce<S, T, F>(source: S, combine: F, config: ParallelConfig) -> Option<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T, T) -> T + Send + Sync + 'static,
{
    let items: Vec<T> = source.collect().await;
    reduce_segments(items, Arc::new(combine), config.concurrency()).await
}

/// [`parallel_reduce`] that stops pulling when `token` fires
///
/// # Errors
///
/// Returns a [`Partial`] holding the reduction of the elements pulled before
/// cancellation.
pub async fn parallel_reduce_ctx<S, T, F>(
    token: &CancelToken,
    source: S,
    combine: F,
    config: ParallelConfig,
) -> Result<Option<T>, Partial<Option<T>>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T, T) -> T + Send + Sync + 'static,
{
    let mut items = Vec::new();
    futures::pin_mut!(source);
    let interrupted = loop {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => None,
            item = source.next() => Some(item),
        };
        match next {
            Some(Some(item)) => items.push(item),
            Some(None) => break None,
            None => break token.error(),
        }
    };

    let reduced = reduce_segments(items, Arc::new(combine), config.concurrency()).await;
    match interrupted {
        Some(error) => Err(Partial::new(reduced, error)),
        None => Ok(reduced),
    }
}

async fn reduce_segments<T, F>(items: Vec<T>, combine: Arc<F>, concurrency: usize) -> Option<T>
where
    T: Send + 'static,
    F: Fn(T, T) -> T + Send + Sync + 'static,
{
    if items.len() < 2 || concurrency < 2 {
        return items.into_iter().reduce(|a, b| combine(a, b));
    }

    let segment_len = items.len().div_ceil(concurrency);
    let mut segments = Vec::with_capacity(concurrency);
    let mut rest = items;
    while rest.len() > segment_len {
        let tail = rest.split_off(segment_len);
        segments.push(rest);
        rest = tail;
    }
    segments.push(rest);

    tracing::trace!(segments = segments.len(), segment_len, "reducing in parallel");

    let handles: Vec<_> = segments
        .into_iter()
        .map(|segment| {
            let combine = Arc::clone(&combine);
            tokio::task::spawn_blocking(move || segment.into_iter().reduce(|a, b| combine(a, b)))
        })
        .collect();

    let mut partials = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(partial) => partials.push(partial),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => {}
        }
    }

    partials.into_iter().flatten().reduce(|a, b| combine(a, b))
}
