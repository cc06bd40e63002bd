//! Streaming Orderer
//!
//! Restores pull order over out-of-order worker results. Results are parked
//! in a table keyed by their index and released as soon as the contiguous
//! prefix starting at `next_index` is complete. The table is unbounded: one
//! slow early element holds back every later, already finished one.

use std::collections::HashMap;

/// Index-keyed parking area for results that arrived ahead of their turn
#[derive(Debug)]
pub struct PendingTable<R> {
    pending: HashMap<u64, R>,
    next_index: u64,
}

impl<R> Default for PendingTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> PendingTable<R> {
    /// Create an empty table expecting index `0` first
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            next_index: 0,
        }
    }

    /// Park a result
    ///
    /// Each index is resolved exactly once by the worker pool, so an index
    /// below `next_index` or already present indicates a caller bug; it is
    /// ignored in release builds.
    pub fn insert(&mut self, index: u64, result: R) {
        debug_assert!(index >= self.next_index, "index {index} already emitted");
        debug_assert!(!self.pending.contains_key(&index), "index {index} resolved twice");
        if index >= self.next_index {
            self.pending.insert(index, result);
        }
    }

    /// Remove and return the result for `next_index` if it has arrived,
    /// advancing `next_index`
    pub fn pop_ready(&mut self) -> Option<R> {
        let result = self.pending.remove(&self.next_index)?;
        self.next_index += 1;
        Some(result)
    }

    /// The index that must resolve next
    #[must_use]
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Number of parked results
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is parked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
