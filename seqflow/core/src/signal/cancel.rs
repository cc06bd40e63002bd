//! Cancellation Token
//!
//! A caller-owned signal observed cooperatively by every long-running task of
//! a pipeline. Cancelling records a [`FlowError`] exactly once and wakes every
//! waiter; child tokens inherit the parent's cancellation.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::FlowError;

/// Cooperative cancellation handle
///
/// Cloning is cheap and every clone observes the same state.
///
/// ```
/// use seqflow_core::{CancelToken, FlowError};
///
/// let token = CancelToken::new();
/// let child = token.child();
/// token.cancel();
/// assert!(child.is_cancelled());
/// assert_eq!(child.error(), Some(FlowError::Cancelled));
/// ```
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    reason: OnceLock<FlowError>,
    notify: Notify,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new() -> Self {
        Self {
            reason: OnceLock::new(),
            notify: Notify::new(),
            children: Mutex::new(Vec::new()),
        }
    }

    fn cancel(&self, reason: FlowError) {
        if self.reason.set(reason).is_err() {
            return;
        }
        self.notify.notify_waiters();

        let children = std::mem::take(&mut *self.children.lock());
        for child in children {
            if let Some(child) = child.upgrade() {
                child.cancel(reason);
            }
        }
    }
}

impl CancelToken {
    /// Create a fresh, uncancelled token
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new()),
        }
    }

    /// A token nobody else holds, used by the operators without a `_ctx` suffix
    #[must_use]
    pub fn never() -> Self {
        Self::new()
    }

    /// Cancel with [`FlowError::Cancelled`]
    ///
    /// Only the first cancellation is recorded; later calls are no-ops.
    pub fn cancel(&self) {
        self.inner.cancel(FlowError::Cancelled);
    }

    /// Whether the token has fired
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.reason.get().is_some()
    }

    /// The error associated with the cancellation, if it has fired
    #[must_use]
    pub fn error(&self) -> Option<FlowError> {
        self.inner.reason.get().copied()
    }

    /// Wait until the token fires
    ///
    /// Resolves immediately if it already has.
    pub async fn cancelled(&self) {
        // Registered before the flag check so a concurrent cancel cannot slip between them.
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Create a token that fires when this one does, but can also be
    /// cancelled on its own without affecting the parent
    #[must_use]
    pub fn child(&self) -> Self {
        let child = Self::new();
        let inherited = {
            let mut children = self.inner.children.lock();
            match self.error() {
                Some(reason) => Some(reason),
                None => {
                    children.retain(|weak| weak.strong_count() > 0);
                    children.push(Arc::downgrade(&child.inner));
                    None
                }
            }
        };
        if let Some(reason) = inherited {
            child.inner.cancel(reason);
        }
        child
    }

    /// Create a child token that additionally fires with
    /// [`FlowError::DeadlineExceeded`] once `timeout` has elapsed
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let child = self.child();
        let deadline = Arc::downgrade(&child.inner);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = deadline.upgrade() {
                tracing::debug!(?timeout, "cancel token deadline reached");
                inner.cancel(FlowError::DeadlineExceeded);
            }
        });
        child
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("error", &self.error())
            .finish()
    }
}
