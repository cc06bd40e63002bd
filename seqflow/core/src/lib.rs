//! Seqflow Core - Concurrent and Time-Driven Operators for Async Streams
//!
//! This crate provides operators over lazy [`Stream`](futures::Stream)s that
//! need more than one task or a clock to do their job: a parallel
//! map/filter/flat-map engine, flow control over time, and time windows.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         Caller pipeline                           │
//! │   source ──► operator ──► operator ──► consumer (pull / drop)     │
//! └───────────────┬──────────────────────────────────┬────────────────┘
//!                 │                                  │
//!      ┌──────────┴──────────┐            ┌──────────┴───────────┐
//!      │      parallel       │            │   timing / window    │
//!      │ ┌────────┐ ┌──────┐ │            │ ┌─────────┐ ┌──────┐ │
//!      │ │ feeder │►│worker│ │            │ │ select! │ │timer │ │
//!      │ └────────┘ │ pool │ │            │ │  loop   │ │ tick │ │
//!      │            └──┬───┘ │            │ └─────────┘ └──────┘ │
//!      │    orderer ◄──┘     │            └──────────┬───────────┘
//!      └──────────┬──────────┘                       │
//!                 └───────────────┬──────────────────┘
//!                                 │
//!      ┌──────────────────────────┴──────────────────────────────┐
//!      │                        signal                            │
//!      │  CancelToken (caller)   DoneSignal (pipeline)  TaskGroup │
//!      └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operator is lazy: nothing runs until the returned stream is
//! polled. Every operator is leak-safe: dropping the returned stream stops
//! and joins all tasks it started.
//!
//! # Cancellation
//!
//! Each operator has a plain form and a `_ctx` form taking a
//! [`CancelToken`]. When the token fires the operator stops; windows flush
//! their pending contents first, [`timing::timeout`] reports the cause
//! in-band, and the terminal operations return what they had in a
//! [`Partial`].
//!
//! # Module Overview
//!
//! - [`parallel`]: parallel map, filter, flat-map, prefetch and terminals
//! - [`timing`]: rate limit, throttle, debounce, sample, delay, timeout,
//!   interval, timer
//! - [`window`]: tumbling, sliding and session time windows
//! - [`signal`]: cancellation token and done broadcast
//! - [`config`]: TOML and environment configuration for the parallel engine
//! - [`FlowExt`]: all of the above as chainable methods

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod ext;
pub mod parallel;
pub mod signal;
pub mod timing;
pub mod window;

/// The stream type every operator returns
pub type FlowStream<T> = futures::stream::BoxStream<'static, T>;

// Re-exports for convenience
pub use config::{load_config, ConfigError, ConfigOverrides, ConfigSource, FlowConfigFile};
pub use error::{FlowError, Partial};
pub use ext::FlowExt;
pub use parallel::{ParallelConfig, ParallelOption};
pub use signal::{CancelToken, DoneSignal};
