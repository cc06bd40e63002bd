//! Background Feeder
//!
//! Pulls a source into a caller-supplied sink until the source is exhausted
//! or the pipeline's done signal closes. The feeder owns the source, so the
//! upstream is only released once the feeder task itself has finished; a
//! coordinator joining the feeder therefore never races an in-flight pull.

use futures::{Stream, StreamExt};

use super::DoneSignal;

/// Items pulled back to back before the feeder yields to the scheduler
const YIELD_EVERY: u32 = 32;

/// How a feeder loop ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FeedEnd {
    /// The source returned `None`
    Exhausted,
    /// The done signal closed first
    Stopped,
}

/// Drive `source` into `sink`, closing `exhausted` if the source runs dry
pub(crate) async fn feed<S, F>(source: S, done: DoneSignal, exhausted: DoneSignal, mut sink: F)
where
    S: Stream + Send,
    F: FnMut(S::Item) + Send,
{
    futures::pin_mut!(source);
    let mut streak = 0u32;
    let end = loop {
        let next = tokio::select! {
            biased;
            () = done.closed() => None,
            item = source.next() => Some(item),
        };
        match next {
            Some(Some(item)) => {
                sink(item);
                // An always-ready source must not starve the consumer
                streak += 1;
                if streak == YIELD_EVERY {
                    streak = 0;
                    tokio::task::yield_now().await;
                }
            }
            Some(None) => break FeedEnd::Exhausted,
            None => break FeedEnd::Stopped,
        }
    };

    if end == FeedEnd::Exhausted {
        tracing::trace!("feeder exhausted its source");
        exhausted.close();
    }
}
