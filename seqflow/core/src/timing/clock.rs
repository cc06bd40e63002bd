//! Clock primitives
//!
//! [`RearmableTimer`] never resets a live sleep in place: arming drops the
//! previous `Sleep` and creates a fresh one, so a deadline that elapsed
//! before the re-arm can never be observed afterwards.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};

use crate::error::FlowError;
use crate::signal::CancelToken;

/// What woke a timer-driven state machine
#[derive(Debug)]
pub(crate) enum Wake<T> {
    Item(T),
    Exhausted,
    Timer,
    Cancelled,
}

impl<T> Wake<T> {
    pub(crate) fn from_next(item: Option<T>) -> Self {
        item.map_or(Self::Exhausted, Self::Item)
    }
}

/// A single optional deadline owned by one state machine
#[derive(Debug, Default)]
pub(crate) struct RearmableTimer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl RearmableTimer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start a fresh `after` countdown, discarding any previous one
    pub(crate) fn arm(&mut self, after: Duration) {
        self.sleep = Some(Box::pin(tokio::time::sleep(after)));
    }

    pub(crate) fn disarm(&mut self) {
        self.sleep = None;
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolves when the armed deadline passes; pends forever while disarmed
    ///
    /// The timer disarms itself on firing. Dropping the returned future
    /// leaves the deadline armed.
    pub(crate) async fn fired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.sleep = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// Periodic ticker whose first tick is one `period` from now
///
/// A slow consumer delays later ticks instead of receiving a burst of
/// catch-up ticks.
pub(crate) fn ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Sleep for `duration` unless `token` fires first
pub(crate) async fn pause(token: &CancelToken, duration: Duration) -> Result<(), FlowError> {
    tokio::select! {
        biased;
        () = token.cancelled() => Err(token.error().unwrap_or(FlowError::Cancelled)),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_deadline_and_disarms() {
        let mut timer = RearmableTimer::new();
        timer.arm(20 * MS);
        let start = Instant::now();
        timer.fired().await;
        assert_eq!(start.elapsed(), 20 * MS);
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_after_elapsed_deadline_has_no_ghost_fire() {
        let mut timer = RearmableTimer::new();
        timer.arm(10 * MS);
        // Let the first deadline pass without observing it
        tokio::time::sleep(30 * MS).await;

        timer.arm(50 * MS);
        let fired_early = tokio::select! {
            () = timer.fired() => true,
            () = tokio::time::sleep(40 * MS) => false,
        };
        assert!(!fired_early);
        assert!(timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_timer_never_fires() {
        let mut timer = RearmableTimer::new();
        timer.arm(5 * MS);
        timer.disarm();
        let fired = tokio::select! {
            () = timer.fired() => true,
            () = tokio::time::sleep(Duration::from_secs(5)) => false,
        };
        assert!(!fired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_skips_immediate_tick() {
        let mut ticks = ticker(25 * MS);
        let start = Instant::now();
        ticks.tick().await;
        assert_eq!(start.elapsed(), 25 * MS);
        ticks.tick().await;
        assert_eq!(start.elapsed(), 50 * MS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_reports_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(pause(&token, Duration::from_secs(1)).await, Err(FlowError::Cancelled));
        assert_eq!(pause(&CancelToken::never(), MS).await, Ok(()));
    }
}
