//! Method-Chaining Adapters
//!
//! [`FlowExt`] exposes the stream-to-stream operators as methods so
//! pipelines read left to right:
//!
//! ```
//! use std::time::Duration;
//! use futures::StreamExt;
//! use seqflow_core::{FlowExt, ParallelConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let out: Vec<u32> = futures::stream::iter(1..=4u32)
//!     .par_map(|x| async move { x * 10 }, ParallelConfig::new().with_concurrency(2))
//!     .throttle(Duration::from_millis(1))
//!     .collect()
//!     .await;
//! assert_eq!(out, vec![10, 20, 30, 40]);
//! # }
//! ```
//!
//! Only the token-free variants are offered here; the `_ctx` free functions
//! remain the way to attach a [`CancelToken`](crate::CancelToken).

use std::future::Future;
use std::time::Duration;

use futures::Stream;

use crate::error::FlowError;
use crate::parallel::{self, ParallelConfig};
use crate::timing;
use crate::window;
use crate::FlowStream;

/// Operator methods for every `Send + 'static` stream
pub trait FlowExt: Stream + Sized + Send + 'static
where
    Self::Item: Send + 'static,
{
    /// See [`parallel::parallel_map`]
    fn par_map<F, Fut, U>(self, f: F, config: ParallelConfig) -> FlowStream<U>
    where
        F: Fn(Self::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = U> + Send + 'static,
        U: Send + 'static,
    {
        parallel::parallel_map(self, f, config)
    }

    /// See [`parallel::parallel_filter`]
    fn par_filter<P, Fut>(self, predicate: P, config: ParallelConfig) -> FlowStream<Self::Item>
    where
        P: Fn(&Self::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        parallel::parallel_filter(self, predicate, config)
    }

    /// See [`parallel::parallel_flat_map`]
    fn par_flat_map<F, Sub>(self, f: F, config: ParallelConfig) -> FlowStream<Sub::Item>
    where
        F: Fn(Self::Item) -> Sub + Send + Sync + 'static,
        Sub: Stream + Send + 'static,
        Sub::Item: Send + 'static,
    {
        parallel::parallel_flat_map(self, f, config)
    }

    /// See [`parallel::prefetch`]
    fn prefetch(self, n: usize) -> FlowStream<Self::Item> {
        parallel::prefetch(self, n)
    }

    /// See [`timing::rate_limit`]
    fn rate_limit(self, n: u32, per: Duration) -> FlowStream<Self::Item> {
        timing::rate_limit(self, n, per)
    }

    /// See [`timing::throttle`]
    fn throttle(self, interval: Duration) -> FlowStream<Self::Item> {
        timing::throttle(self, interval)
    }

    /// See [`timing::debounce`]
    fn debounce(self, quiet: Duration) -> FlowStream<Self::Item> {
        timing::debounce(self, quiet)
    }

    /// See [`timing::sample`]
    fn sample(self, interval: Duration) -> FlowStream<Self::Item> {
        timing::sample(self, interval)
    }

    /// See [`timing::delay`]
    fn delay(self, duration: Duration) -> FlowStream<Self::Item> {
        timing::delay(self, duration)
    }

    /// See [`timing::timeout`]
    fn timeout(self, duration: Duration) -> FlowStream<Result<Self::Item, FlowError>> {
        timing::timeout(self, duration)
    }

    /// See [`window::tumbling_time_window`]
    fn tumbling_window(self, size: Duration) -> FlowStream<Vec<Self::Item>> {
        window::tumbling_time_window(self, size)
    }

    /// See [`window::sliding_time_window`]
    fn sliding_window(self, size: Duration, slide: Duration) -> FlowStream<Vec<Self::Item>>
    where
        Self::Item: Clone,
    {
        window::sliding_time_window(self, size, slide)
    }

    /// See [`window::session_window`]
    fn session_window(self, gap: Duration) -> FlowStream<Vec<Self::Item>> {
        window::session_window(self, gap)
    }
}

impl<S> FlowExt for S
where
    S: Stream + Sized + Send + 'static,
    S::Item: Send + 'static,
{
}
