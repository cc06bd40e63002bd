//! Parallel Execution Engine
//!
//! Concurrent map, filter and flat-map over async streams, with selectable
//! ordering and bounded-memory reordering, plus the terminal operations that
//! drive them.
//!
//! # Modes
//!
//! - **Unordered**: results in completion order. Output is a permutation of
//!   the sequential result.
//! - **Ordered, streaming** (`chunk_size == 0`): results in input order, held
//!   back in an unbounded [`PendingTable`] while earlier elements are still
//!   running.
//! - **Ordered, chunked** (`chunk_size > 0`): the source is processed in
//!   batches of `chunk_size`; at most `chunk_size` results wait at any time.
//!
//! Every mode shares one shutdown path. Dropping the output stream, firing
//! the [`CancelToken`](crate::CancelToken) passed to a `_ctx` operator, or
//! exhausting the source tears down the feeder and every worker.

mod chunked;
mod config;
mod ops;
mod orderer;
mod pool;
mod prefetch;
mod terminal;

pub use config::{ParallelConfig, ParallelOption};
pub use ops::{
    parallel_filter, parallel_filter_ctx, parallel_flat_map, parallel_flat_map_ctx, parallel_map,
    parallel_map_ctx,
};
pub use orderer::PendingTable;
pub use prefetch::prefetch;
pub use terminal::{
    parallel_collect, parallel_collect_ctx, parallel_for_each, parallel_for_each_ctx,
    parallel_reduce, parallel_reduce_ctx,
};
