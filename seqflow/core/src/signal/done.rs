//! One-Shot Close Primitive
//!
//! The shutdown broadcast of a single pipeline. Closing is guarded by an
//! atomic compare-and-exchange so exactly one caller performs it, whichever of
//! consumer stop, token cancellation or natural completion gets there first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Exactly-once shutdown broadcast shared by every task of a pipeline
#[derive(Clone, Debug, Default)]
pub struct DoneSignal {
    inner: Arc<DoneInner>,
}

#[derive(Debug, Default)]
struct DoneInner {
    closed: AtomicBool,
    notify: Notify,
}

impl DoneSignal {
    /// Create an open signal
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the signal, waking every task parked in [`DoneSignal::closed`]
    ///
    /// Returns `true` only for the call that actually performed the close.
    pub fn close(&self) -> bool {
        let won = self
            .inner
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.inner.notify.notify_waiters();
        }
        won
    }

    /// Non-blocking check
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Wait until the signal is closed
    pub async fn closed(&self) {
        let notified = self.inner.notify.notified();
        if self.is_closed() {
            return;
        }
        notified.await;
    }
}
