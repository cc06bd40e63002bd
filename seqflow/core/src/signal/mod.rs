//! Cancellation and Leak-Safety Primitives
//!
//! Shared shutdown discipline of every operator in this crate:
//!
//! - [`CancelToken`]: caller-owned cooperative cancellation
//! - [`DoneSignal`]: exactly-once close broadcast scoped to one pipeline
//! - `TaskGroup`: join barrier that closes the broadcast on drop and re-raises
//!   task panics on shutdown
//! - `feed`: background source puller that owns the upstream
//!
//! A pipeline's done signal closes on whichever fires first: the consumer
//! dropping the stream, the token firing, or the pipeline completing. Every
//! blocking point inside a task (`send`, `recv`, timer waits) selects against
//! it, so no task outlives the stream it backs.

mod cancel;
mod done;
mod feeder;
mod group;

pub use cancel::CancelToken;
pub use done::DoneSignal;

pub(crate) use feeder::feed;
pub(crate) use group::TaskGroup;
