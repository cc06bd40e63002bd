//! Cancellation and Leak-Safety Tests
//!
//! These tests verify the shutdown discipline shared by every operator:
//! - Dropping an output stream stops every task it started
//! - A fired token ends `_ctx` streams promptly
//! - Interrupted terminal operations hand back their partial results
//! - Time windows flush on cancellation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use futures::{stream, StreamExt};
use pretty_assertions::assert_eq;

use seqflow_core::parallel::{
    parallel_collect_ctx, parallel_for_each_ctx, parallel_map, parallel_map_ctx,
    parallel_reduce_ctx, prefetch,
};
use seqflow_core::timing::{interval_ctx, sample};
use seqflow_core::window::tumbling_time_window_ctx;
use seqflow_core::{CancelToken, FlowError, FlowStream, ParallelConfig};

const MS: Duration = Duration::from_millis(1);

/// Counts live clones of itself
#[derive(Clone, Default)]
struct Probe(Arc<()>);

impl Probe {
    fn outstanding(&self) -> usize {
        Arc::strong_count(&self.0) - 1
    }
}

// =============================================================================
// Early Drop
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_dropping_parallel_map_releases_everything() {
    let probe = Probe::default();

    let held_by_source = probe.clone();
    let source = stream::iter(0u64..).map(move |x| {
        let _alive = &held_by_source;
        x
    });
    let held_by_fn = probe.clone();
    let mut out = parallel_map(
        source,
        move |x| {
            let _alive = &held_by_fn;
            async move { x }
        },
        ParallelConfig::new().with_concurrency(4).with_buffer_size(2),
    );

    assert_eq!(out.next().await, Some(0));
    assert!(probe.outstanding() > 0);
    drop(out);

    tokio::time::sleep(100 * MS).await;
    assert_eq!(probe.outstanding(), 0);
}

/// Pull one element through `build`, drop the result, and check that the
/// infinite source behind it was released
async fn assert_releases_source<F>(build: F)
where
    F: FnOnce(FlowStream<u32>) -> FlowStream<u32>,
{
    let probe = Probe::default();
    let held = probe.clone();
    let source = stream::iter(0u32..)
        .map(move |x| {
            let _alive = &held;
            x
        })
        .boxed();
    let mut out = build(source);
    assert!(out.next().await.is_some());
    drop(out);

    tokio::time::sleep(100 * MS).await;
    assert_eq!(probe.outstanding(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_prefetch_releases_source() {
    assert_releases_source(|s| prefetch(s, 4)).await;
}

// An always-ready source keeps the feeder runnable, so the paused clock
// would never auto-advance to the first tick
#[tokio::test]
async fn test_dropping_sample_releases_source() {
    assert_releases_source(|s| sample(s, 10 * MS)).await;
}

// =============================================================================
// Token Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_ctx_stream_ends_after_cancel() {
    let token = CancelToken::new();
    let mut out = parallel_map_ctx(
        &token,
        stream::iter(0u64..),
        |x| async move {
            tokio::time::sleep(MS).await;
            x
        },
        ParallelConfig::new().with_concurrency(2),
    );
    assert_eq!(out.next().await, Some(0));
    token.cancel();

    let remaining = tokio::time::timeout(Duration::from_secs(1), async {
        let mut n = 0;
        while out.next().await.is_some() {
            n += 1;
        }
        n
    })
    .await
    .expect("stream must end after cancellation");
    assert!(remaining <= 4, "drained {remaining} items after cancel");
}

#[tokio::test(start_paused = true)]
async fn test_collect_ctx_returns_partial_on_deadline() {
    let token = CancelToken::new().with_timeout(55 * MS);
    let result = parallel_collect_ctx(
        &token,
        stream::iter(0u32..),
        |x| async move {
            tokio::time::sleep(10 * MS).await;
            x
        },
        ParallelConfig::new().with_concurrency(1),
    )
    .await;

    let partial = result.expect_err("deadline should interrupt an infinite source");
    assert_eq!(partial.error(), FlowError::DeadlineExceeded);
    assert!(!partial.value().is_empty());
    assert_eq!(partial.value()[0], 0);
}

#[tokio::test(start_paused = true)]
async fn test_for_each_ctx_reports_explicit_cancel() {
    let token = CancelToken::new();
    let seen = Arc::new(AtomicUsize::new(0));

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(30 * MS).await;
            token.cancel();
        })
    };

    let counter = Arc::clone(&seen);
    let result = parallel_for_each_ctx(
        &token,
        stream::iter(0u32..),
        move |_| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(10 * MS).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        },
        ParallelConfig::new().with_concurrency(2),
    )
    .await;

    assert_eq!(result, Err(FlowError::Cancelled));
    assert!(seen.load(Ordering::SeqCst) > 0);
    canceller.await.expect("canceller");
}

/// Element 0 never finishes within the test
async fn stall_first(x: u32) -> u32 {
    if x == 0 {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }
    x
}

fn every_mode() -> [(&'static str, ParallelConfig); 3] {
    let base = ParallelConfig::new().with_concurrency(2);
    [
        ("streaming", base.clone()),
        ("chunked", base.clone().with_chunk_size(4)),
        ("unordered", base.with_ordered(false)),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_deadline_abandons_in_flight_calls() {
    for (mode, config) in every_mode() {
        let token = CancelToken::new().with_timeout(10 * MS);
        let started = Instant::now();
        let result = parallel_collect_ctx(&token, stream::iter(0u32..8), stall_first, config).await;

        assert!(
            started.elapsed() < Duration::from_secs(1),
            "{mode}: returned after {:?}",
            started.elapsed()
        );
        let partial = result.expect_err("the stalled element was never delivered");
        assert_eq!(partial.error(), FlowError::DeadlineExceeded, "{mode}");
        assert!(!partial.value().contains(&0), "{mode}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_stream_ends_despite_stuck_call() {
    for (mode, config) in every_mode() {
        let token = CancelToken::new().with_timeout(10 * MS);
        let started = Instant::now();
        let out: Vec<u32> = parallel_map_ctx(&token, stream::iter(0u32..8), stall_first, config)
            .collect()
            .await;

        assert!(started.elapsed() < Duration::from_secs(1), "{mode}");
        assert!(!out.contains(&0), "{mode}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_for_each_ctx_abandons_in_flight_calls() {
    let token = CancelToken::new().with_timeout(10 * MS);
    let started = Instant::now();
    let result = parallel_for_each_ctx(
        &token,
        stream::iter(0u32..8),
        |x| async move {
            stall_first(x).await;
        },
        ParallelConfig::new().with_concurrency(2),
    )
    .await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(result, Err(FlowError::DeadlineExceeded));
}

#[tokio::test]
async fn test_cancel_after_exhaustion_is_not_an_error() {
    let token = CancelToken::new();
    let on_exhaustion = token.clone();
    // The token fires in the same poll that reports the end of the source
    let source = stream::iter(1u64..=10).chain(
        stream::once(async move { on_exhaustion.cancel() }).filter_map(|()| async { None }),
    );

    let result = parallel_reduce_ctx(&token, source, |a, b| a + b, ParallelConfig::new()).await;

    assert!(token.is_cancelled());
    assert_eq!(result.expect("every element was folded"), Some(55));
}

#[tokio::test(start_paused = true)]
async fn test_parent_cancel_reaches_child_pipeline() {
    let parent = CancelToken::new();
    let child = parent.child();
    let mut ticks = interval_ctx(&child, 10 * MS);

    assert_eq!(ticks.next().await, Some(0));
    parent.cancel();
    assert_eq!(ticks.next().await, None);
    assert_eq!(child.error(), Some(FlowError::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn test_window_flushes_when_deadline_fires() {
    let token = CancelToken::new().with_timeout(25 * MS);
    let source = stream::iter([1, 2, 3]).chain(stream::pending());
    let windows: Vec<Vec<i32>> = tumbling_time_window_ctx(&token, source, Duration::from_secs(60))
        .collect()
        .await;
    assert_eq!(windows, vec![vec![1, 2, 3]]);
}
