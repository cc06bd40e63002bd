//! Parallel map / filter / flat-map
//!
//! Every operator funnels into one of three engines picked from the
//! [`ParallelConfig`]:
//!
//! | mode                    | engine                                  |
//! |-------------------------|-----------------------------------------|
//! | unordered               | worker pool, completion order           |
//! | ordered, `chunk == 0`   | worker pool + [`PendingTable`]          |
//! | ordered, `chunk > 0`    | chunked orderer                         |
//!
//! Filter rides on the same engines with `Option<T>` results so that a
//! rejected element still resolves its slot. Ordered flat-map drains each
//! sub-stream into a `Vec` for the same reason.

use std::future::{self, Future};

use async_stream::stream;
use futures::{Stream, StreamExt};

use super::chunked::chunked;
use super::orderer::PendingTable;
use super::pool::{Outlet, WorkItem, WorkerPool};
use super::ParallelConfig;
use crate::signal::CancelToken;
use crate::FlowStream;

// ============================================================================
// Engines
// ============================================================================

fn dispatch<S, T, F, Fut, R>(
    token: CancelToken,
    source: S,
    config: ParallelConfig,
    f: F,
) -> FlowStream<R>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    if !config.ordered() {
        unordered(token, source, config, f)
    } else if config.is_chunked() {
        chunked(source, config, token, f)
    } else {
        streaming_ordered(token, source, config, f)
    }
}

fn unordered<S, T, F, Fut, R>(
    token: CancelToken,
    source: S,
    config: ParallelConfig,
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
        let mut pool = WorkerPool::<R>::spawn(
            source,
            &config,
            &token,
            move |item: WorkItem<T>, out: Outlet<R>| {
                let pending = f(item.value);
                async move { out.send(pending.await).await }
            },
        );
        while let Some(result) = pool.next().await {
            yield result;
        }
        pool.shutdown().await;
    }
    .boxed()
}

fn streaming_ordered<S, T, F, Fut, R>(
    token: CancelToken,
    source: S,
    config: ParallelConfig,
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
        let mut pool = WorkerPool::<(u64, R)>::spawn(
            source,
            &config,
            &token,
            move |item: WorkItem<T>, out: Outlet<(u64, R)>| {
                let index = item.index;
                let pending = f(item.value);
                async move { out.send((index, pending.await)).await }
            },
        );
        let mut table = PendingTable::new();
        while let Some((index, result)) = pool.next().await {
            table.insert(index, result);
            while let Some(ready) = table.pop_ready() {
                yield ready;
            }
        }
        if !table.is_empty() {
            tracing::debug!(
                parked = table.len(),
                next_index = table.next_index(),
                "ordered stream stopped with parked results"
            );
        }
        pool.shutdown().await;
    }
    .boxed()
}

// ============================================================================
// Map
// ============================================================================

/// Apply an async function to every element with up to `concurrency`
/// invocations in flight
///
/// ```
/// use futures::StreamExt;
/// use seqflow_core::parallel::{parallel_map, ParallelConfig};
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = ParallelConfig::new().with_concurrency(2);
/// let doubled: Vec<i32> = parallel_map(futures::stream::iter(1..=5), |x| async move { x * 2 }, config)
///     .collect()
///     .await;
/// assert_eq!(doubled, vec![2, 4, 6, 8, 10]);
/// # }
/// ```
pub fn parallel_map<S, T, F, Fut, U>(source: S, f: F, config: ParallelConfig) -> FlowStream<U>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
    U: Send + 'static,
{
    parallel_map_ctx(&CancelToken::never(), source, f, config)
}

/// [`parallel_map`] that stops as soon as `token` fires
///
/// Results already emitted stay emitted; the stream simply ends.
pub fn parallel_map_ctx<S, T, F, Fut, U>(
    token: &CancelToken,
    source: S,
    f: F,
    config: ParallelConfig,
) -> FlowStream<U>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
    U: Send + 'static,
{
    dispatch(token.clone(), source, config, f)
}

// ============================================================================
// Filter
// ============================================================================

/// Keep the elements for which the async predicate returns `true`
///
/// The predicate borrows the element only to build its future, which must
/// own whatever it needs (`|x| future::ready(*x > 3)`).
pub fn parallel_filter<S, T, P, Fut>(source: S, predicate: P, config: ParallelConfig) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    P: Fn(&T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    parallel_filter_ctx(&CancelToken::never(), source, predicate, config)
}

/// [`parallel_filter`] that stops as soon as `token` fires
pub fn parallel_filter_ctx<S, T, P, Fut>(
    token: &CancelToken,
    source: S,
    predicate: P,
    config: ParallelConfig,
) -> FlowStream<T>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    P: Fn(&T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    let judge = move |value: T| {
        let verdict = predicate(&value);
        async move { verdict.await.then_some(value) }
    };
    dispatch(token.clone(), source, config, judge)
        .filter_map(future::ready)
        .boxed()
}

// ============================================================================
// Flat-map
// ============================================================================

/// Replace every element by the elements of the stream `f` returns for it
///
/// In ordered mode each sub-stream is drained completely before its slot
/// resolves; in unordered mode sub-stream elements are forwarded as they
/// arrive and may interleave.
pub fn parallel_flat_map<S, T, F, Sub>(source: S, f: F, config: ParallelConfig) -> FlowStream<Sub::Item>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Sub + Send + Sync + 'static,
    Sub: Stream + Send + 'static,
    Sub::Item: Send + 'static,
{
    parallel_flat_map_ctx(&CancelToken::never(), source, f, config)
}

/// [`parallel_flat_map`] that stops as soon as `token` fires
pub fn parallel_flat_map_ctx<S, T, F, Sub>(
    token: &CancelToken,
    source: S,
    f: F,
    config: ParallelConfig,
) -> FlowStream<Sub::Item>
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Sub + Send + Sync + 'static,
    Sub: Stream + Send + 'static,
    Sub::Item: Send + 'static,
{
    if config.ordered() {
        let drain = move |value: T| f(value).collect::<Vec<_>>();
        return dispatch(token.clone(), source, config, drain)
            .flat_map(futures::stream::iter)
            .boxed();
    }

    let token = token.clone();
    stream! {
        let mut pool = WorkerPool::<Sub::Item>::spawn(
            source,
            &config,
            &token,
            move |item: WorkItem<T>, out: Outlet<Sub::Item>| {
                let sub = f(item.value);
                async move {
                    futures::pin_mut!(sub);
                    while let Some(value) = sub.next().await {
                        if !out.send(value).await {
                            return false;
                        }
                    }
                    true
                }
            },
        );
        while let Some(value) = pool.next().await {
            yield value;
        }
        pool.shutdown().await;
    }
    .boxed()
}
