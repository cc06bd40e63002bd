//! Time Windows
//!
//! Batch a stream by arrival time:
//!
//! - [`tumbling_time_window`]: consecutive fixed-length, non-overlapping
//! - [`sliding_time_window`]: fixed-length, re-evaluated every `slide`
//! - [`session_window`]: delimited by inactivity gaps
//!
//! Windows flush their pending contents when the source ends and when the
//! token of a `_ctx` variant fires. Dropping the stream discards them.

mod buffer;
mod session;
mod sliding;
mod ticked;
mod tumbling;

pub use buffer::TimedBuffer;
pub use session::{session_window, session_window_ctx};
pub use sliding::{sliding_time_window, sliding_time_window_ctx};
pub use tumbling::{tumbling_time_window, tumbling_time_window_ctx};
