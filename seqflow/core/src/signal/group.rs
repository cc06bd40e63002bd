//! Task Group (join barrier)
//!
//! Every operator that spawns tasks registers them here. The group owns the
//! pipeline's [`DoneSignal`], so all of a pipeline's tasks share one shutdown
//! broadcast, and dropping the group (consumer stopped early) closes it
//! without waiting.

use std::future::Future;

use tokio::task::JoinHandle;

use super::{CancelToken, DoneSignal};

/// Join barrier over the tasks backing one pipeline
pub(crate) struct TaskGroup {
    done: DoneSignal,
    handles: Vec<JoinHandle<()>>,
}

impl TaskGroup {
    pub(crate) fn new() -> Self {
        Self {
            done: DoneSignal::new(),
            handles: Vec::new(),
        }
    }

    /// The shared shutdown broadcast
    pub(crate) fn done(&self) -> &DoneSignal {
        &self.done
    }

    pub(crate) fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handles.push(tokio::spawn(task));
    }

    /// Fan a token cancellation out to the whole group
    ///
    /// The watcher exits on its own once the group shuts down.
    pub(crate) fn watch(&mut self, token: &CancelToken) {
        let token = token.clone();
        let done = self.done.clone();
        self.spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    if done.close() {
                        tracing::debug!(error = ?token.error(), "cancellation closed pipeline");
                    }
                }
                () = done.closed() => {}
            }
        });
    }

    /// Close the broadcast and wait for every task to exit
    ///
    /// A task that panicked has its panic re-raised here, so user-function
    /// faults terminate the consumer rather than vanishing with the task.
    pub(crate) async fn shutdown(mut self) {
        self.done.close();
        let handles = std::mem::take(&mut self.handles);
        for handle in handles {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }
    }
}

impl Drop for TaskGroup {
    fn drop(&mut self) {
        if self.done.close() && !self.handles.is_empty() {
            tracing::trace!(
                tasks = self.handles.len(),
                "pipeline dropped before completion"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_joins_tasks() {
        let mut group = TaskGroup::new();
        let finished = Arc::new(AtomicBool::new(false));
        {
            let done = group.done().clone();
            let finished = Arc::clone(&finished);
            group.spawn(async move {
                done.closed().await;
                finished.store(true, Ordering::SeqCst);
            });
        }
        group.shutdown().await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_drop_closes_done() {
        let group = TaskGroup::new();
        let done = group.done().clone();
        drop(group);
        assert!(done.is_closed());
    }

    #[tokio::test]
    async fn test_watch_closes_on_cancel() {
        let token = CancelToken::new();
        let mut group = TaskGroup::new();
        group.watch(&token);
        let done = group.done().clone();

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), done.closed())
            .await
            .expect("cancellation should reach the group");
        group.shutdown().await;
    }

    #[tokio::test]
    #[should_panic(expected = "worker fault")]
    async fn test_shutdown_reraises_task_panic() {
        let mut group = TaskGroup::new();
        group.spawn(async { panic!("worker fault") });
        group.shutdown().await;
    }
}
