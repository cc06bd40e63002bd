//! Worker Pool
//!
//! Fan-out/fan-in topology shared by the unordered and streaming-ordered
//! operators:
//!
//! ```text
//!  source ──► feeder ──► [input queue] ──► worker × N ──► [output queue] ──► consumer
//!               │                             │                  ▲
//!               └────────── DoneSignal ───────┴──────────────────┘
//! ```
//!
//! Both queues are bounded by the configured buffer size, so a slow consumer
//! throttles the workers and the workers throttle the feeder. The output
//! queue closes by itself once every worker has dropped its [`Outlet`].

use std::future::Future;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, Mutex};

use super::ParallelConfig;
use crate::signal::{CancelToken, DoneSignal, TaskGroup};

/// An element paired with its position in pull order
#[derive(Debug)]
pub(crate) struct WorkItem<T> {
    pub(crate) index: u64,
    pub(crate) value: T,
}

/// Worker-side handle to the bounded output queue
pub(crate) struct Outlet<O> {
    tx: mpsc::Sender<O>,
    done: DoneSignal,
}

impl<O> Clone for Outlet<O> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            done: self.done.clone(),
        }
    }
}

impl<O> Outlet<O> {
    /// Push a result, giving up if the pipeline shuts down first
    ///
    /// Returns `false` when the value could not be delivered; the worker
    /// should stop.
    pub(crate) async fn send(&self, value: O) -> bool {
        tokio::select! {
            biased;
            () = self.done.closed() => false,
            sent = self.tx.send(value) => sent.is_ok(),
        }
    }
}

/// A running feeder plus `concurrency` workers, read from the consumer side
pub(crate) struct WorkerPool<O> {
    output: mpsc::Receiver<O>,
    group: Option<TaskGroup>,
}

impl<O: Send + 'static> WorkerPool<O> {
    /// Start the feeder and workers
    ///
    /// `work` is invoked once per element with a fresh [`Outlet`]; it may emit
    /// any number of results and returns `false` to stop its worker. A call
    /// still running when the pipeline closes is dropped mid-flight.
    pub(crate) fn spawn<S, W, Fut>(
        source: S,
        config: &ParallelConfig,
        token: &CancelToken,
        work: W,
    ) -> Self
    where
        S: Stream + Send + 'static,
        S::Item: Send + 'static,
        W: Fn(WorkItem<S::Item>, Outlet<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let capacity = config.buffer_size();
        let (input_tx, input_rx) = mpsc::channel::<WorkItem<S::Item>>(capacity);
        let (output_tx, output_rx) = mpsc::channel::<O>(capacity);

        let mut group = TaskGroup::new();
        group.watch(token);
        let done = group.done().clone();

        tracing::debug!(
            concurrency = config.concurrency(),
            buffer_size = capacity,
            "starting worker pool"
        );

        // Feeder
        {
            let done = done.clone();
            group.spawn(async move {
                futures::pin_mut!(source);
                let mut index = 0u64;
                loop {
                    let next = tokio::select! {
                        biased;
                        () = done.closed() => None,
                        item = source.next() => item,
                    };
                    let Some(value) = next else { break };

                    let sent = tokio::select! {
                        biased;
                        () = done.closed() => false,
                        sent = input_tx.send(WorkItem { index, value }) => sent.is_ok(),
                    };
                    if !sent {
                        break;
                    }
                    index += 1;
                }
                tracing::trace!(items = index, "feeder finished");
            });
        }

        // Workers
        let work = Arc::new(work);
        let input = Arc::new(Mutex::new(input_rx));
        let outlet = Outlet {
            tx: output_tx,
            done: done.clone(),
        };
        for worker in 0..config.concurrency() {
            let work = Arc::clone(&work);
            let input = Arc::clone(&input);
            let outlet = outlet.clone();
            let done = done.clone();
            group.spawn(async move {
                loop {
                    let next = {
                        let mut input = input.lock().await;
                        tokio::select! {
                            biased;
                            () = done.closed() => None,
                            item = input.recv() => item,
                        }
                    };
                    let Some(item) = next else { break };
                    let more = tokio::select! {
                        biased;
                        () = done.closed() => false,
                        more = work(item, outlet.clone()) => more,
                    };
                    if !more {
                        break;
                    }
                }
                tracing::trace!(worker, "worker exiting");
            });
        }
        // Only worker-held outlets may keep the output queue open
        drop(outlet);

        Self {
            output: output_rx,
            group: Some(group),
        }
    }

    /// Next result in completion order, or `None` once the workers are done
    /// or the pipeline was cancelled
    pub(crate) async fn next(&mut self) -> Option<O> {
        let Some(group) = self.group.as_ref() else {
            return None;
        };
        let done = group.done();
        tokio::select! {
            biased;
            () = done.closed() => None,
            item = self.output.recv() => item,
        }
    }

    /// Tear the pool down: close, drain the output queue, join every task
    pub(crate) async fn shutdown(mut self) {
        let Some(group) = self.group.take() else {
            return;
        };
        group.done().close();
        self.output.close();
        while self.output.recv().await.is_some() {}
        group.shutdown().await;
    }
}

impl<O> Drop for WorkerPool<O> {
    fn drop(&mut self) {
        // Consumer stopped early: unblock any worker parked on a full queue.
        // The group's own drop closes the done signal.
        self.output.close();
        while self.output.try_recv().is_ok() {}
    }
}
