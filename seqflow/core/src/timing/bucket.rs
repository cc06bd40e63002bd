//! Token Bucket
//!
//! Refillable counter bounding throughput. The bucket starts full with
//! `capacity` tokens and regains one token per `per / capacity`, computed
//! lazily from the time elapsed since the last refill and capped at
//! `capacity`. An empty bucket never rejects: [`TokenBucket::acquire`] waits
//! one refill interval and then grants exactly one token.
//!
//! Timestamps are `tokio::time::Instant`, so the bucket follows a paused test
//! clock.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::FlowError;
use crate::signal::CancelToken;

/// Token bucket for `capacity` emissions per `per`
#[derive(Clone, Debug)]
pub struct TokenBucket {
    tokens: u32,
    capacity: u32,
    refill_interval: Duration,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket allowing `capacity` emissions per `per`
    ///
    /// Returns `None` when `capacity` is zero.
    #[must_use]
    pub fn new(capacity: u32, per: Duration) -> Option<Self> {
        Self::new_at(capacity, per, Instant::now())
    }

    /// [`TokenBucket::new`] with an explicit starting instant
    #[must_use]
    pub fn new_at(capacity: u32, per: Duration, now: Instant) -> Option<Self> {
        if capacity == 0 {
            return None;
        }
        Some(Self {
            tokens: capacity,
            capacity,
            refill_interval: per / capacity,
            last_refill: now,
        })
    }

    /// Maximum number of tokens
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Time to regain one token
    #[must_use]
    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    /// Tokens currently held (as of the last refill)
    #[must_use]
    pub fn available(&self) -> u32 {
        self.tokens
    }

    /// Credit the tokens earned between the last refill and `now`
    pub fn refill_at(&mut self, now: Instant) {
        if self.refill_interval.is_zero() {
            self.tokens = self.capacity;
            self.last_refill = now;
            return;
        }

        let elapsed = now.saturating_duration_since(self.last_refill);
        let earned = elapsed.as_nanos() / self.refill_interval.as_nanos();
        if earned == 0 {
            return;
        }

        let missing = self.capacity - self.tokens;
        match u32::try_from(earned) {
            Ok(earned) if earned < missing => {
                self.tokens += earned;
                // Keep the fractional progress toward the next token
                self.last_refill += self.refill_interval * earned;
            }
            _ => {
                self.tokens = self.capacity;
                self.last_refill = now;
            }
        }
    }

    /// Take one token if available at `now`
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.refill_at(now);
        if self.tokens == 0 {
            return false;
        }
        self.tokens -= 1;
        true
    }

    /// Take one token, waiting one refill interval if the bucket is empty
    ///
    /// # Errors
    ///
    /// Returns the token's error if `cancel` fires during the wait; no token
    /// is granted in that case.
    pub async fn acquire(&mut self, cancel: &CancelToken) -> Result<(), FlowError> {
        if self.try_acquire_at(Instant::now()) {
            return Ok(());
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(cancel.error().unwrap_or(FlowError::Cancelled)),
            () = tokio::time::sleep(self.refill_interval) => {
                // The waited-for token is consumed on the spot
                self.last_refill = Instant::now();
                Ok(())
            }
        }
    }
}
