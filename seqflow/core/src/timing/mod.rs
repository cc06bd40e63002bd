//! Time-Driven Flow Control
//!
//! Operators that decide *when* elements are emitted:
//!
//! - [`rate_limit`] / [`throttle`]: delay, never drop
//! - [`debounce`] / [`sample`]: drop superseded elements
//! - [`delay`]: fixed latency per element
//! - [`timeout`]: in-band `DeadlineExceeded` failures on silence
//! - [`interval`] / [`timer`]: pure generators
//!
//! Every timer is a fresh `tokio::time::Sleep` per wait, so a deadline from a
//! previous wait can never fire into the next one. All waits use tokio's
//! clock and therefore run deterministically under
//! `#[tokio::test(start_paused = true)]`.

mod bucket;
pub(crate) mod clock;
mod debounce;
mod delay;
mod generators;
mod rate;
mod sample;
mod timeout;

pub use bucket::TokenBucket;
pub use debounce::{debounce, debounce_ctx};
pub use delay::{delay, delay_ctx};
pub use generators::{interval, interval_ctx, timer, timer_ctx};
pub use rate::{rate_limit, rate_limit_ctx, throttle, throttle_ctx};
pub use sample::{sample, sample_ctx};
pub use timeout::{timeout, timeout_ctx};
