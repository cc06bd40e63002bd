//! Timed Buffer

use std::time::Duration;

use tokio::time::Instant;

/// Arrival-ordered elements paired with their arrival time
#[derive(Clone, Debug)]
pub struct TimedBuffer<T> {
    entries: Vec<(T, Instant)>,
}

impl<T> Default for TimedBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimedBuffer<T> {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an element stamped with the current time
    pub fn push(&mut self, value: T) {
        self.push_at(value, Instant::now());
    }

    /// Append an element with an explicit arrival time
    ///
    /// Callers keep arrival times non-decreasing.
    pub fn push_at(&mut self, value: T, at: Instant) {
        if let Some((_, last)) = self.entries.last() {
            debug_assert!(*last <= at, "arrival times went backwards");
        }
        self.entries.push((value, at));
    }

    /// Number of buffered elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arrival time of the oldest element
    #[must_use]
    pub fn oldest(&self) -> Option<Instant> {
        self.entries.first().map(|(_, at)| *at)
    }

    /// Remove and return every element, leaving the buffer empty
    pub fn take(&mut self) -> Vec<T> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(value, _)| value)
            .collect()
    }

    /// Drop the elements that arrived more than `window` before `now`
    pub fn evict_older_than(&mut self, window: Duration, now: Instant) {
        self.entries
            .retain(|(_, at)| now.saturating_duration_since(*at) <= window);
    }
}

impl<T: Clone> TimedBuffer<T> {
    /// Copy out the buffered elements, oldest first
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.entries.iter().map(|(value, _)| value.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_take_empties_buffer() {
        let mut buffer = TimedBuffer::new();
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.take(), vec![1, 2]);
        assert!(buffer.is_empty());
        assert!(buffer.take().is_empty());
    }

    #[test]
    fn test_evict_keeps_recent_entries_in_order() {
        let start = Instant::now();
        let mut buffer = TimedBuffer::new();
        for (i, offset) in [0u32, 10, 20, 30, 40].into_iter().enumerate() {
            buffer.push_at(i, start + offset * MS);
        }

        buffer.evict_older_than(25 * MS, start + 50 * MS);
        assert_eq!(buffer.values(), vec![3, 4]);
        assert_eq!(buffer.oldest(), Some(start + 30 * MS));
    }

    #[test]
    fn test_evict_keeps_entry_exactly_at_boundary() {
        let start = Instant::now();
        let mut buffer = TimedBuffer::new();
        buffer.push_at('a', start);
        buffer.evict_older_than(10 * MS, start + 10 * MS);
        assert_eq!(buffer.values(), vec!['a']);
        buffer.evict_older_than(10 * MS, start + 11 * MS);
        assert!(buffer.is_empty());
    }
}
